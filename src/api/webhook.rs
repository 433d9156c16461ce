//! Webhook controller: live GitHub deliveries and the manual test trigger

use axum::{
    body::Bytes,
    extract::{Query, State as AxumState},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::SharedState;
use crate::deploy::{DeployReport, run_deployment};
use crate::error::{RelayError, Result};
use crate::filter::{self, FilterDecision};
use crate::pipeline::{self, PipelineRecord};
use crate::signature::verify_signature;

fn pipeline_name(params: &HashMap<String, String>) -> Result<&str> {
    let name = params.get("pipeline").map(String::as_str).unwrap_or("");
    if name.is_empty() {
        return Err(RelayError::Validation("Pipeline name is required.".to_string()));
    }
    if !pipeline::is_valid_name(name) {
        return Err(RelayError::Validation(format!(
            "Pipeline name '{}' is invalid. Use only letters, numbers, dashes, and underscores.",
            name
        )));
    }
    Ok(name)
}

async fn resolve_pipeline(
    state: &SharedState,
    params: &HashMap<String, String>,
) -> Result<PipelineRecord> {
    let name = pipeline_name(params)?;
    state
        .store
        .get(name)
        .await?
        .ok_or_else(|| RelayError::NotFound(name.to_string()))
}

/// Run the pull under the pipeline's execution guard and write back the
/// last-run timestamp. The write-back is best-effort; a failed deployment
/// is still a deployment attempt.
async fn execute_and_record(state: &SharedState, mut pipeline: PipelineRecord) -> DeployReport {
    let lock = state.deploy_locks.handle(&pipeline.name);
    let _guard = lock.lock().await;

    let report = run_deployment(&pipeline, state.config.deploy_timeout()).await;

    pipeline.last_run_at = Some(report.finished_at);
    if let Err(e) = state.store.put(&pipeline).await {
        error!(
            "Failed to record last run for pipeline '{}': {}",
            pipeline.name, e
        );
    }
    report
}

/// Handles the GitHub webhook POST request.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let pipeline = resolve_pipeline(&state, &params).await?;

    // Verification runs only when both a secret and a signature header
    // are present; otherwise the request is let through. Records created
    // by this relay always carry a secret, so in practice only callers
    // that never configured the secret on the GitHub side skip it.
    let signature_opt = headers
        .get("X-Hub-Signature-256")
        .and_then(|v| v.to_str().ok());
    match signature_opt {
        Some(signature) if !pipeline.webhook_secret.is_empty() => {
            if !verify_signature(&pipeline.webhook_secret, &body, signature) {
                error!(
                    "Signature verification failed for pipeline '{}'!",
                    pipeline.name
                );
                return Err(RelayError::Auth);
            }
        }
        _ => {
            warn!(
                "Pipeline '{}': skipping signature verification (no secret or no signature header)",
                pipeline.name
            );
        }
    }

    let event = headers
        .get("X-GitHub-Event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // An unparseable body is treated the same as a payload without a
    // "ref" field: the filter sees an empty ref.
    let git_ref = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|payload| {
            payload
                .get("ref")
                .and_then(|r| r.as_str())
                .map(String::from)
        })
        .unwrap_or_default();

    match filter::evaluate(event, &git_ref, &pipeline.branch_name) {
        FilterDecision::Skip(reason) => {
            info!("Pipeline '{}': {}", pipeline.name, reason);
            Ok((StatusCode::OK, format!("{}\n", reason)).into_response())
        }
        FilterDecision::Proceed => {
            info!(
                "Pipeline '{}': push event accepted, starting deployment",
                pipeline.name
            );
            let report = execute_and_record(&state, pipeline).await;
            Ok((StatusCode::OK, report.render()).into_response())
        }
    }
}

/// Handles the manual test trigger (`GET /webhook?pipeline=x&test=true`).
/// Skips verification and filtering but runs a real deployment.
pub async fn trigger_test(
    AxumState(state): AxumState<SharedState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response> {
    let is_test = params.get("test").map(|v| v == "true").unwrap_or(false);
    if !is_test {
        return Err(RelayError::Validation(
            "Manual trigger requires test=true.".to_string(),
        ));
    }

    let pipeline = resolve_pipeline(&state, &params).await?;
    info!("Pipeline '{}': manual test trigger", pipeline.name);

    let mut response = format!(
        "TEST MODE - Pipeline Details\n\
         ==========================\n\
         Name: {}\n\
         Repository: {}/{}\n\
         Branch: {}\n\
         Directory: {}\n\
         ==========================\n\n\
         Running test deployment...\n\n",
        pipeline.name,
        pipeline.remote_owner,
        pipeline.remote_repo,
        pipeline.branch_name,
        pipeline.repo_directory
    );

    let report = execute_and_record(&state, pipeline).await;
    response.push_str(&report.render());

    Ok((StatusCode::OK, response).into_response())
}
