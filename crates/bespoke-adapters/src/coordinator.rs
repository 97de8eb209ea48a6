//! Cliente del API del coordinador (CLI y herramientas).
use bespoke_core::wire::{SubmitRequest, SubmitResponse, TaskLink, TaskView};
use bespoke_core::{Status, TransportError};
use reqwest::Client;
use serde_json::Value;

use crate::http::{build_client, decode, join, send_error};

#[derive(Clone)]
pub struct CoordinatorClient {
    client: Client,
    root: String,
}

impl CoordinatorClient {
    pub fn new(base_url: &str, prefix: &str) -> Result<Self, TransportError> {
        Ok(Self { client: build_client()?,
                  root: join(base_url, prefix) })
    }

    pub async fn submit(&self, input_schema: Value) -> Result<SubmitResponse, TransportError> {
        let response = self.client
                           .post(format!("{}/optimizations", self.root))
                           .json(&SubmitRequest { input_schema })
                           .send()
                           .await
                           .map_err(send_error)?;
        decode(response).await
    }

    pub async fn get(&self, id: &str) -> Result<TaskView, TransportError> {
        let response = self.client
                           .get(format!("{}/optimizations/{}", self.root, id))
                           .send()
                           .await
                           .map_err(send_error)?;
        decode(response).await
    }

    pub async fn list(&self, status: Option<Status>, skip: usize, limit: usize) -> Result<Vec<TaskLink>, TransportError> {
        let mut query = vec![("skip", skip.to_string()), ("limit", limit.to_string())];
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        let response = self.client
                           .get(format!("{}/optimizations", self.root))
                           .query(&query)
                           .send()
                           .await
                           .map_err(send_error)?;
        decode(response).await
    }
}
