//! HTTP server setup and the discovery endpoint.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::discovery::{Discoverer, render};

/// Build the router. Every path and method gets the discovery document, so
/// an `http_sd_configs` URL such as `http://sd:9999/targets` works too.
pub fn router(discoverer: Arc<Discoverer>) -> Router {
    Router::new()
        .route("/", any(discovery_document))
        .fallback(discovery_document)
        .with_state(discoverer)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, discoverer: Arc<Discoverer>) -> std::io::Result<()> {
    info!(address = %listener.local_addr()?, "serving discovery document");
    axum::serve(listener, router(discoverer))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn discovery_document(State(discoverer): State<Arc<Discoverer>>) -> Response {
    let result = discoverer
        .discover()
        .await
        .and_then(|entries| render(&entries).map(|body| (entries.len(), body)));

    match result {
        Ok((count, body)) => {
            info!(targets = count, "served discovery document");
            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "discovery request failed");
            e.into_response()
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
