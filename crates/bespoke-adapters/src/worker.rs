use async_trait::async_trait;
use bespoke_core::{JobHandle, JobReport, TransportError, WorkerClient, WorkerFamily};
use log::debug;
use reqwest::Client;
use serde_json::Value;

use crate::http::{build_client, decode, join, send_error};

/// `WorkerClient` sobre HTTP: `{base}{prefix}/{family}[/{id}]`.
#[derive(Clone)]
pub struct HttpWorkerClient {
    client: Client,
    root: String,
}

impl HttpWorkerClient {
    pub fn new(base_url: &str, prefix: &str) -> Result<Self, TransportError> {
        Ok(Self { client: build_client()?,
                  root: join(base_url, prefix) })
    }

    fn family_url(&self, family: WorkerFamily) -> String {
        format!("{}/{}", self.root, family.segment())
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn submit(&self, family: WorkerFamily, body: &Value) -> Result<JobHandle, TransportError> {
        let url = self.family_url(family);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await.map_err(send_error)?;
        decode(response).await
    }

    async fn report(&self, family: WorkerFamily, id: &str) -> Result<JobReport, TransportError> {
        let url = format!("{}/{}", self.family_url(family), id);
        let response = self.client.get(&url).send().await.map_err(send_error)?;
        decode(response).await
    }

    async fn report_many(&self, family: WorkerFamily, ids: &[String]) -> Result<Vec<JobReport>, TransportError> {
        let query: Vec<(&str, &str)> = ids.iter().map(|id| ("ids", id.as_str())).collect();
        let response = self.client
                           .get(self.family_url(family))
                           .query(&query)
                           .send()
                           .await
                           .map_err(send_error)?;
        decode(response).await
    }
}
