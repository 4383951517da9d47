//! Configuration for the unifi-sd discovery bridge.
//!
//! A JSON file (path from `CONFIG_FILE`, default `config.json`) with
//! optional `UNIFI_SD_*` environment overrides, validated once at startup
//! into an immutable [`DiscoveryConfig`].

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
    value::{Dict, Value},
};
use miette::Diagnostic;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Environment variable naming the configuration file.
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

/// Configuration file used when `CONFIG_FILE` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Prefix for per-field environment overrides (`UNIFI_SD_PASSWORD`, ...).
pub const ENV_PREFIX: &str = "UNIFI_SD_";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to open config file {}", .path.display())]
    #[diagnostic(
        code(unifi_sd::config_io),
        help("Point CONFIG_FILE (or --config) at the JSON configuration file.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", .path.display())]
    #[diagnostic(
        code(unifi_sd::config_parse),
        help("The file must be a JSON object with unifi_url, blackbox_url, Site, Username, Password, listen_port and insecure_https. UNIFI_SD_* overrides must match the field type.")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("invalid {field}: {reason}")]
    #[diagnostic(code(unifi_sd::config_invalid))]
    Validation { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── File model ──────────────────────────────────────────────────────

/// The configuration document, field for field as written.
///
/// Absent fields take their zero value here; [`ConfigFile::validate`]
/// decides whether that is acceptable.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Controller base URL (e.g., "https://unifi.lan:8443").
    pub unifi_url: String,

    /// Blackbox exporter base URL (e.g., "http://blackbox:9115").
    pub blackbox_url: String,

    /// Controller site identifier.
    #[serde(rename = "Site", alias = "site")]
    pub site: String,

    #[serde(rename = "Username", alias = "username")]
    pub username: String,

    #[serde(rename = "Password", alias = "password")]
    pub password: String,

    pub listen_port: u16,

    /// Skip TLS certificate verification on controller calls.
    pub insecure_https: bool,

    /// Outbound request timeout in seconds.
    pub timeout_secs: Option<u64>,

    /// Reuse a login session for this many seconds. Unset or 0 logs in
    /// on every discovery request.
    pub session_ttl_secs: Option<u64>,
}

impl fmt::Debug for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFile")
            .field("unifi_url", &self.unifi_url)
            .field("blackbox_url", &self.blackbox_url)
            .field("site", &self.site)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("listen_port", &self.listen_port)
            .field("insecure_https", &self.insecure_https)
            .field("timeout_secs", &self.timeout_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

impl ConfigFile {
    /// Check every field and build the runtime configuration.
    ///
    /// Reports the first invalid field by its config-file name.
    pub fn validate(&self) -> Result<DiscoveryConfig, ConfigError> {
        let controller_url = parse_http_url("unifi_url", &self.unifi_url)?;
        parse_http_url("blackbox_url", &self.blackbox_url)?;
        require("Site", &self.site)?;
        require("Username", &self.username)?;
        require("Password", &self.password)?;

        if self.listen_port == 0 {
            return Err(ConfigError::invalid(
                "listen_port",
                "must be between 1 and 65535",
            ));
        }

        let timeout_secs = self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::invalid("timeout_secs", "must be at least 1"));
        }

        Ok(DiscoveryConfig {
            controller_url,
            blackbox_url: self.blackbox_url.clone(),
            site: self.site.clone(),
            username: self.username.clone(),
            password: SecretString::from(self.password.clone()),
            listen_port: self.listen_port,
            insecure_https: self.insecure_https,
            timeout: Duration::from_secs(timeout_secs),
            session_ttl: Duration::from_secs(self.session_ttl_secs.unwrap_or(0)),
        })
    }
}

fn require(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn parse_http_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    require(field, value)?;
    let url: Url = value
        .parse()
        .map_err(|e| ConfigError::invalid(field, format!("invalid URL '{value}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::invalid(
            field,
            format!("expected an http or https URL, got scheme '{other}'"),
        )),
    }
}

// ── Runtime config ──────────────────────────────────────────────────

/// Validated configuration. Built once at startup, shared read-only.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub controller_url: Url,
    /// Kept verbatim; probe targets are built by string concatenation.
    pub blackbox_url: String,
    pub site: String,
    pub username: String,
    pub password: SecretString,
    pub listen_port: u16,
    pub insecure_https: bool,
    pub timeout: Duration,
    pub session_ttl: Duration,
}

impl DiscoveryConfig {
    /// Listen on every interface at the configured port.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.listen_port))
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Read and parse the configuration file alone.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Figment::from(Json::string(&contents))
        .extract()
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
}

/// Fields taken from the environment verbatim. Left to figment,
/// `UNIFI_SD_PASSWORD=007` would be read as the number 7.
const VERBATIM_FIELDS: [&str; 5] = ["unifi_url", "blackbox_url", "site", "username", "password"];

/// Environment variable suffix (lowercased) to config-file key.
fn file_key(env_key: &str) -> String {
    match env_key {
        "site" => "Site".into(),
        "username" => "Username".into(),
        "password" => "Password".into(),
        other => other.to_owned(),
    }
}

/// Load the configuration file and merge `UNIFI_SD_*` environment overrides.
///
/// Overrides beat the file. A value that does not convert to its field's
/// type is reported as a parse error.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let file = load_config_file(path)?;

    let env = Env::prefixed(ENV_PREFIX);
    let verbatim: Dict = env
        .clone()
        .only(&VERBATIM_FIELDS)
        .iter()
        .map(|(key, value)| (file_key(key.as_str()), Value::from(value)))
        .collect();

    Figment::from(Serialized::defaults(file))
        .merge(env.ignore(&VERBATIM_FIELDS))
        .merge(Serialized::defaults(verbatim))
        .extract()
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
}
