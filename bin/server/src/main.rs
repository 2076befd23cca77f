//! Chatflow HTTP server.
//!
//! Wires the production boundaries (reqwest completion client, reqwest
//! HTTP sink, logging delivery sinks) into the workflow engine and serves
//! the run endpoint.

mod clients;
mod config;
mod routes;

use std::sync::Arc;

use chatflow_engine::{Boundaries, FlowRunner};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::clients::{HttpCompletionBackend, LoggingNotifier, LoggingTransport, ReqwestHttpSink};
use crate::config::ServerConfig;
use crate::routes::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().expect("failed to load configuration");
    if config.completion.api_key.is_empty() {
        tracing::warn!("no completion api key configured; AI nodes will use local fallbacks");
    }

    let completion =
        HttpCompletionBackend::new(config.completion.clone()).expect("failed to build completion client");
    let http = ReqwestHttpSink::new().expect("failed to build http client");

    let boundaries = Boundaries {
        completion: Arc::new(completion),
        http: Arc::new(http),
        notifier: Arc::new(LoggingNotifier),
    };
    let state = AppState {
        runner: Arc::new(FlowRunner::with_boundaries(boundaries)),
        transport: Arc::new(LoggingTransport),
    };

    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
