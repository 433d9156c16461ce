//! HTTP handlers and router assembly

pub mod pipelines;
pub mod webhook;

use axum::{Router, routing};

use crate::SharedState;

pub use pipelines::{create_pipeline, delete_pipeline, list_pipelines};
pub use webhook::{handle_webhook, trigger_test};

pub async fn root() -> &'static str {
    concat!("deploy_relay ", env!("CARGO_PKG_VERSION"))
}

/// Assemble the application router. Shared with the integration tests.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", routing::get(root))
        .route("/webhook", routing::get(trigger_test).post(handle_webhook))
        .route(
            "/api/pipelines",
            routing::get(list_pipelines).post(create_pipeline),
        )
        .route("/api/pipelines/{name}", routing::delete(delete_pipeline))
        .with_state(state)
}
