//! HTTP classification service.
//!
//! This module serves the trained classifier over HTTP: clients upload a WAV
//! clip to `POST /predict` as multipart form data and receive the predicted
//! label with its probability. `GET /health` and `GET /schema` expose service
//! state and the feature contract.

mod routes;

pub use routes::{
    build_router, health, predict, schema, AppState, HealthResponse, HttpErrorCodes,
    HttpServerError,
};

use std::net::SocketAddr;

use anyhow::Context;
use log::info;

use crate::config::ServerConfig;
use crate::context::InferenceContext;

/// Run the HTTP server loop until Ctrl-C
pub async fn run_http_server(context: InferenceContext, server: &ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = server
        .bind_addr
        .parse()
        .with_context(|| format!("parsing bind address {:?}", server.bind_addr))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", addr))?;
    info!(
        "[HTTP] Listening on {} ({} labels, timeout {} ms, {} concurrent requests)",
        addr,
        context.classifier().labels().len(),
        server.request_timeout_ms,
        server.max_concurrent_requests
    );

    let router = build_router(context, server);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP router")?;

    info!("[HTTP] Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("[HTTP] Failed to listen for Ctrl-C: {}", err);
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    info!("[HTTP] Shutdown requested");
}
