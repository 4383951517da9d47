//! Request-path and startup error types.
//!
//! Request failures become an HTTP error response for that request only.
//! Startup failures are rendered through miette and end the process.

use std::net::SocketAddr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use unifi_sd_config::ConfigError;

/// A failed discovery request.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("controller login failed: {0}")]
    Auth(#[source] unifi_sd_api::Error),

    #[error("device inventory fetch failed: {0}")]
    Fetch(#[source] unifi_sd_api::Error),

    #[error("encoding discovery document failed: {0}")]
    Encode(#[source] serde_json::Error),
}

impl DiscoveryError {
    /// Short machine-readable name, also used as the `kind` response field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Fetch(_) => "fetch",
            Self::Encode(_) => "encode",
        }
    }

    /// Upstream failures are the controller's fault; encoding is ours.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) | Self::Fetch(_) => StatusCode::BAD_GATEWAY,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl IntoResponse for DiscoveryError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Failures that stop the service before or while it listens.
#[derive(Debug, Error, Diagnostic)]
pub enum StartupError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build controller client")]
    #[diagnostic(code(unifi_sd::client))]
    Client(#[from] unifi_sd_api::Error),

    #[error("could not listen on {addr}")]
    #[diagnostic(
        code(unifi_sd::bind),
        help("Another process may own the port; change listen_port in the configuration.")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server failed")]
    #[diagnostic(code(unifi_sd::serve))]
    Serve(#[source] std::io::Error),
}
