use thiserror::Error;

/// Top-level error type for the `unifi-sd-api` crate.
///
/// Covers every failure mode of the two controller calls we make:
/// login, transport, and inventory decoding. `unifi-sd` sorts these into
/// auth and fetch failures for the HTTP response.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The controller rejected the session cookie (HTTP 401).
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Controller responses ────────────────────────────────────────
    /// Non-success HTTP status, with a preview of the body.
    #[error("Controller returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Error from the legacy `{meta: {rc, msg}}` envelope.
    #[error("Legacy API error: {message}")]
    LegacyApi { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates auth has expired
    /// and a fresh login might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::SessionExpired)
    }
}
