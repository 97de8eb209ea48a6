use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use bespoke_core::wire::{SubmitRequest, SubmitResponse, TaskLink, TaskView};
use bespoke_core::Status;
use bespoke_domain::BespokeOptimizationSchema;
use log::info;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use super::{blocking, mount};
use crate::error::ApiError;
use crate::state::CoordinatorState;

const DEFAULT_PAGE_SIZE: usize = 100;

pub fn coordinator_router(state: CoordinatorState) -> Router {
    let prefix = state.prefix.clone();
    let api = Router::new().route("/optimizations", get(list_optimizations).post(create_optimization))
                           .route("/optimizations/:id", get(get_optimization))
                           .with_state(state);
    mount(&prefix, api).route("/healthz", get(|| async { "ok" }))
                       .layer(TraceLayer::new_for_http())
}

fn self_link(prefix: &str, id: u64) -> String {
    format!("{}/optimizations/{}", prefix.trim_end_matches('/'), id)
}

async fn create_optimization(State(state): State<CoordinatorState>,
                             Json(request): Json<SubmitRequest>)
                             -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let input: BespokeOptimizationSchema =
        serde_json::from_value(request.input_schema).map_err(|e| ApiError::Unprocessable(format!("invalid input schema: {e}")))?;
    let repo = state.repo.clone();
    let task = blocking(move || repo.create(input).map_err(ApiError::from)).await?;
    info!("optimization submitted task_id={}", task.id);
    Ok((StatusCode::CREATED,
        Json(SubmitResponse { id: task.id.to_string(),
                              self_link: self_link(&state.prefix, task.id) })))
}

async fn get_optimization(State(state): State<CoordinatorState>, Path(id): Path<String>) -> Result<Json<TaskView>, ApiError> {
    let id: u64 = id.parse().map_err(|_| ApiError::NotFound(format!("task {id} not found")))?;
    let repo = state.repo.clone();
    let task = blocking(move || repo.load(id).map_err(ApiError::from)).await?;
    Ok(Json(task.view(self_link(&state.prefix, task.id))))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    skip: usize,
    limit: Option<usize>,
    status: Option<String>,
}

async fn list_optimizations(State(state): State<CoordinatorState>,
                            Query(params): Query<ListParams>)
                            -> Result<Json<Vec<TaskLink>>, ApiError> {
    let status = match params.status.as_deref() {
        Some(raw) => Some(Status::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("unknown status '{raw}'")))?),
        None => None,
    };
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let repo = state.repo.clone();
    let tasks = blocking(move || repo.list(status, params.skip, limit).map_err(ApiError::from)).await?;
    Ok(Json(tasks.iter()
                 .map(|t| TaskLink { id: t.id.to_string(),
                                     self_link: self_link(&state.prefix, t.id),
                                     status: t.status() })
                 .collect()))
}
