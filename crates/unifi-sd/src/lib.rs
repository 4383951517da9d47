//! Prometheus HTTP service discovery for UniFi-managed devices.
//!
//! Each request to the HTTP endpoint logs in to the controller, lists the
//! site's devices, and answers with one blackbox-exporter ICMP probe target
//! per device.

pub mod discovery;
pub mod error;
pub mod server;

pub use discovery::{DiscoveryEntry, Discoverer};
pub use error::{DiscoveryError, StartupError};
