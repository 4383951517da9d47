// unifi-sd-api: Async client for the UniFi controller's login and inventory endpoints

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use auth::Session;
pub use client::ControllerClient;
pub use error::Error;
pub use models::Device;
pub use session::SessionCache;
pub use transport::{TlsMode, TransportConfig};
