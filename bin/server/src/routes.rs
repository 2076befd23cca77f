//! HTTP routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chatflow_engine::{FlowRunner, RunReport, RunRequest};
use chatflow_integration::{MessagingTransport, Recipient};
use tracing::warn;

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<FlowRunner>,
    pub transport: Arc<dyn MessagingTransport>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/runs", post(execute_run))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Runs one workflow against one inbound message and returns the result.
///
/// Delivery goes through the configured transport (logging-only when the
/// server runs standalone); the report is returned to the caller either
/// way, so a transport failure never hides the run outcome.
async fn execute_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Json<RunReport> {
    let recipient = if request.contact.email.is_empty() {
        Recipient::new("unknown")
    } else {
        Recipient::new(request.contact.email.clone())
    };

    let report = state.runner.run(request).await;

    if !report.effects.is_empty() {
        let payloads: Vec<serde_json::Value> = report
            .effects
            .iter()
            .filter_map(|e| serde_json::to_value(e).ok())
            .collect();
        if let Err(err) = state.transport.deliver(&recipient, &payloads).await {
            warn!(error = %err, "effect delivery failed");
        }
    }

    Json(report)
}
