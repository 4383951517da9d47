// Transport configuration for building the outbound reqwest::Client.
//
// The client is built once at startup from configuration and shared by
// every request handler. TLS verification is a property of this one
// client, never of process-wide state.

use std::time::Duration;

use tracing::debug;

use crate::error::Error;

const USER_AGENT: &str = concat!("unifi-sd/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode for controller calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the bundled webpki root store.
    System,
    /// Accept any certificate (for self-signed controllers).
    DangerAcceptInvalid,
}

impl TlsMode {
    /// Map the config file's `insecure_https` toggle onto a mode.
    pub fn from_insecure(insecure: bool) -> Self {
        if insecure {
            Self::DangerAcceptInvalid
        } else {
            Self::System
        }
    }
}

/// Transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    pub fn new(tls: TlsMode, timeout: Duration) -> Self {
        Self { tls, timeout }
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// No cookie store is attached: session cookies travel explicitly with
    /// each [`Session`](crate::Session) so concurrent requests never share
    /// a jar.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        match self.tls {
            TlsMode::System => {}
            TlsMode::DangerAcceptInvalid => {
                debug!("TLS certificate verification disabled for controller calls");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
