use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use bespoke_core::{JobHandle, JobReport, WorkerFamily};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use super::{blocking, mount};
use crate::error::ApiError;
use crate::state::WorkerState;

pub fn worker_router(state: WorkerState, prefix: &str) -> Router {
    let api = Router::new().route("/:family", post(submit_job).get(list_jobs))
                           .route("/:family/:id", get(get_job))
                           .with_state(state);
    mount(prefix, api).layer(TraceLayer::new_for_http())
}

fn family(raw: &str) -> Result<WorkerFamily, ApiError> {
    raw.parse().map_err(ApiError::NotFound)
}

async fn submit_job(State(state): State<WorkerState>,
                    Path(raw): Path<String>,
                    Json(body): Json<Value>)
                    -> Result<Json<JobHandle>, ApiError> {
    let family = family(&raw)?;
    let services = state.services.clone();
    let handle = blocking(move || services.get(family).submit(&body).map_err(ApiError::from)).await?;
    Ok(Json(handle))
}

async fn get_job(State(state): State<WorkerState>, Path((raw, id)): Path<(String, String)>) -> Result<Json<JobReport>, ApiError> {
    let family = family(&raw)?;
    let services = state.services.clone();
    let report = blocking(move || services.get(family).report(&id).map_err(ApiError::from)).await?;
    Ok(Json(report))
}

/// `GET /{family}?ids=a&ids=b`: las claves repetidas no caben en un struct,
/// así que se leen como pares.
async fn list_jobs(State(state): State<WorkerState>,
                   Path(raw): Path<String>,
                   Query(pairs): Query<Vec<(String, String)>>)
                   -> Result<Json<Vec<JobReport>>, ApiError> {
    let family = family(&raw)?;
    let ids: Vec<String> = pairs.into_iter().filter(|(k, _)| k == "ids").map(|(_, v)| v).collect();
    let services = state.services.clone();
    let reports = blocking(move || services.get(family).report_many(&ids).map_err(ApiError::from)).await?;
    Ok(Json(reports))
}
