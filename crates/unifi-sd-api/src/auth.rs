// Controller authentication
//
// Cookie-based session login. The login endpoint answers with session
// cookies; they are captured into a `Session` value that the caller hands
// to each subsequent request instead of living in a shared cookie jar.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{debug, warn};

use crate::client::ControllerClient;
use crate::error::Error;

/// Session identifiers issued by the controller on login.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    cookies: Vec<(String, String)>,
    csrf_token: Option<String>,
}

impl Session {
    pub fn new(cookies: Vec<(String, String)>, csrf_token: Option<String>) -> Self {
        Self {
            cookies,
            csrf_token,
        }
    }

    /// Cookie names, in the order the controller set them.
    pub fn cookie_names(&self) -> impl Iterator<Item = &str> {
        self.cookies.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    /// The `Cookie` request header value, e.g. `"unifises=abc; csrf_token=def"`.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }

    /// Attach the session cookies (and CSRF token, if any) to a request.
    pub(crate) fn apply(&self, mut builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(ref token) = self.csrf_token {
            builder = builder.header("X-CSRF-Token", token);
        }
        builder
    }
}

// Cookie values are credentials; keep them out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookies", &self.cookie_names().collect::<Vec<_>>())
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ControllerClient {
    /// Authenticate with the controller using username/password.
    ///
    /// `POST /api/login` with `{"username": "...", "password": "..."}`.
    /// On success the returned [`Session`] carries the cookies the
    /// controller set. A non-success status becomes
    /// `Error::Authentication` with the full response body in the message.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Session, Error> {
        let url = self.api_url("login")?;

        debug!("logging in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let cookies: Vec<(String, String)> = resp
            .cookies()
            .map(|c| (c.name().to_owned(), c.value().to_owned()))
            .collect();

        let csrf_token = resp
            .headers()
            .get("X-CSRF-Token")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        if cookies.is_empty() {
            warn!("controller accepted login but set no session cookies");
        }

        let session = Session::new(cookies, csrf_token);
        debug!(?session, "login successful");
        Ok(session)
    }
}
