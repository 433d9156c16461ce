//! Pipeline admin API: the JSON counterpart of the management UI

use axum::{
    Json,
    extract::{Path, State as AxumState},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::SharedState;
use crate::pipeline::{NewPipeline, PipelineRecord};

/// Externally visible view of a record. The credential token stays out;
/// the webhook secret is included because the operator must copy it into
/// GitHub's webhook settings.
#[derive(Debug, Serialize)]
pub struct PipelineView {
    pub name: String,
    pub repo_directory: String,
    pub branch_name: String,
    pub remote_owner: String,
    pub remote_repo: String,
    pub webhook_secret: String,
    pub webhook_url: String,
    pub created_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl PipelineView {
    fn from_record(record: &PipelineRecord, state: &SharedState) -> Self {
        Self {
            name: record.name.clone(),
            repo_directory: record.repo_directory.clone(),
            branch_name: record.branch_name.clone(),
            remote_owner: record.remote_owner.clone(),
            remote_repo: record.remote_repo.clone(),
            webhook_secret: record.webhook_secret.clone(),
            webhook_url: state.config.webhook_url(&record.name),
            created_at: record.created_at,
            last_run_at: record.last_run_at,
        }
    }
}

/// POST /api/pipelines - Register a new pipeline
pub async fn create_pipeline(
    AxumState(state): AxumState<SharedState>,
    Json(fields): Json<NewPipeline>,
) -> impl IntoResponse {
    let record = match PipelineRecord::create(fields) {
        Ok(record) => record,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()})))
                .into_response();
        }
    };

    // Creation never overwrites; the name is the identity of the record.
    match state.store.get(&record.name).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({"error": "Pipeline with this name already exists."})),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to check for existing pipeline: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response();
        }
    }

    if let Err(e) = state.store.put(&record).await {
        error!("Failed to store pipeline '{}': {}", record.name, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response();
    }

    info!("Created pipeline '{}'", record.name);
    (
        StatusCode::CREATED,
        Json(PipelineView::from_record(&record, &state)),
    )
        .into_response()
}

/// GET /api/pipelines - List all registered pipelines
pub async fn list_pipelines(AxumState(state): AxumState<SharedState>) -> impl IntoResponse {
    match state.store.list().await {
        Ok(records) => {
            let pipelines: Vec<_> = records
                .iter()
                .map(|r| PipelineView::from_record(r, &state))
                .collect();
            Json(json!({
                "pipelines": pipelines,
                "count": pipelines.len(),
            }))
            .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// DELETE /api/pipelines/{name} - Remove a pipeline permanently
pub async fn delete_pipeline(
    AxumState(state): AxumState<SharedState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.store.delete(&name).await {
        Ok(true) => {
            info!("Deleted pipeline '{}'", name);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Pipeline not found."})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
