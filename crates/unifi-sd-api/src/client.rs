// Controller HTTP client
//
// Wraps `reqwest::Client` with UniFi-specific URL construction and response
// checking. The login and inventory calls are implemented as inherent
// methods in `auth.rs` and `devices.rs` to keep this module focused on
// transport mechanics.

use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest slice of an error body carried in `Error::Status`.
const BODY_PREVIEW_LEN: usize = 512;

/// Raw HTTP client for a classic UniFi Network controller.
///
/// Holds no session state. Every call takes the [`Session`](crate::Session)
/// it should authenticate with, so one client can serve concurrent
/// discovery requests.
#[derive(Debug, Clone)]
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    site: String,
}

impl ControllerClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// The `base_url` is the controller root, e.g. `https://controller:8443`.
    pub fn new(base_url: Url, site: String, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            site,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, site: String) -> Self {
        Self {
            http,
            base_url,
            site,
        }
    }

    /// The site whose inventory is listed.
    pub fn site(&self) -> &str {
        &self.site
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a controller-level URL: `{base}/api/{path}`
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    /// Build a site-scoped URL: `{base}/api/s/{site}/{path}`
    pub(crate) fn site_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/s/{}/{path}", self.site))?)
    }

    // ── Response helpers ─────────────────────────────────────────────

    /// Check the status and decode a JSON body.
    ///
    /// 401 maps to `SessionExpired`; any other non-success status keeps a
    /// preview of the body so the caller can see what the controller said.
    pub(crate) async fn parse_json<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(len = body.len(), "decoding controller response");

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// Truncate a body for error messages without splitting a UTF-8 sequence.
pub(crate) fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ControllerClient {
        ControllerClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).expect("test URL"),
            "default".into(),
        )
    }

    #[test]
    fn site_url_without_trailing_slash() {
        let url = client("https://controller:8443").site_url("stat/device");
        assert_eq!(
            url.expect("site URL").as_str(),
            "https://controller:8443/api/s/default/stat/device"
        );
    }

    #[test]
    fn api_url_keeps_base_path() {
        let url = client("https://host/unifi/").api_url("login");
        assert_eq!(url.expect("api URL").as_str(), "https://host/unifi/api/login");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(BODY_PREVIEW_LEN);
        let cut = preview(&body);
        assert!(cut.len() <= BODY_PREVIEW_LEN);
        assert!(body.starts_with(cut));
        assert_eq!(preview("short"), "short");
    }
}
