//! The request pipeline: login, list devices, build the discovery document.

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::Serialize;
use tracing::debug;

use unifi_sd_api::{ControllerClient, Device, Session, SessionCache, TlsMode, TransportConfig};
use unifi_sd_config::DiscoveryConfig;

use crate::error::DiscoveryError;

pub const LABEL_IP: &str = "ip";
pub const LABEL_NAME: &str = "name";
pub const LABEL_TYPE: &str = "type";
pub const LABEL_MODEL: &str = "model";

/// One target group of the Prometheus HTTP SD document.
///
/// Labels are a `BTreeMap` so they serialize in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryEntry {
    pub targets: Vec<String>,
    pub labels: BTreeMap<String, String>,
}

impl DiscoveryEntry {
    /// An ICMP probe of `device` through the blackbox exporter.
    pub fn for_device(device: &Device, blackbox_url: &str) -> Self {
        let labels = BTreeMap::from([
            (LABEL_IP.to_owned(), device.ip.clone()),
            (LABEL_NAME.to_owned(), device.name.clone()),
            (LABEL_TYPE.to_owned(), device.device_type.clone()),
            (LABEL_MODEL.to_owned(), device.model.clone()),
        ]);
        Self {
            targets: vec![probe_target(blackbox_url, &device.ip)],
            labels,
        }
    }
}

/// `{blackbox_url}/probe?module=icmp&target={ip}`, concatenated verbatim.
pub fn probe_target(blackbox_url: &str, ip: &str) -> String {
    format!("{blackbox_url}/probe?module=icmp&target={ip}")
}

/// One entry per device, in controller order.
pub fn to_entries(devices: &[Device], blackbox_url: &str) -> Vec<DiscoveryEntry> {
    devices
        .iter()
        .map(|device| DiscoveryEntry::for_device(device, blackbox_url))
        .collect()
}

/// Serialize the whole document up front so a failure never leaves a
/// partial body on the wire. Newline-terminated.
pub fn render(entries: &[DiscoveryEntry]) -> Result<Vec<u8>, DiscoveryError> {
    let mut body = serde_json::to_vec(entries).map_err(DiscoveryError::Encode)?;
    body.push(b'\n');
    Ok(body)
}

/// Runs the discovery pipeline against one controller site.
///
/// Shared by every request handler. Holds only the immutable configuration,
/// the pooled HTTP client, and the optional session cache.
#[derive(Debug)]
pub struct Discoverer {
    client: ControllerClient,
    username: String,
    password: SecretString,
    blackbox_url: String,
    sessions: SessionCache,
}

impl Discoverer {
    pub fn new(
        client: ControllerClient,
        username: String,
        password: SecretString,
        blackbox_url: String,
        sessions: SessionCache,
    ) -> Self {
        Self {
            client,
            username,
            password,
            blackbox_url,
            sessions,
        }
    }

    /// Build the controller client (TLS mode, timeout) from validated config.
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self, unifi_sd_api::Error> {
        let transport =
            TransportConfig::new(TlsMode::from_insecure(config.insecure_https), config.timeout);
        let client = ControllerClient::new(
            config.controller_url.clone(),
            config.site.clone(),
            &transport,
        )?;
        Ok(Self::new(
            client,
            config.username.clone(),
            config.password.clone(),
            config.blackbox_url.clone(),
            SessionCache::new(config.session_ttl),
        ))
    }

    /// Authenticate, fetch the inventory, and map it to discovery entries.
    pub async fn discover(&self) -> Result<Vec<DiscoveryEntry>, DiscoveryError> {
        let session = self.session().await?;

        let devices = match self.client.list_devices(&session).await {
            Ok(devices) => devices,
            Err(e) => {
                if e.is_auth_expired() {
                    self.sessions.invalidate_if(&session).await;
                }
                return Err(DiscoveryError::Fetch(e));
            }
        };

        debug!(count = devices.len(), "mapping devices to probe targets");
        Ok(to_entries(&devices, &self.blackbox_url))
    }

    /// A cached session when one is fresh, otherwise a new login.
    async fn session(&self) -> Result<Session, DiscoveryError> {
        if let Some(session) = self.sessions.get().await {
            return Ok(session);
        }

        let session = self
            .client
            .login(&self.username, &self.password)
            .await
            .map_err(DiscoveryError::Auth)?;
        self.sessions.store(session.clone()).await;
        Ok(session)
    }
}
