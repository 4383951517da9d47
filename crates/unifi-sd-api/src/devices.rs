// Device inventory endpoint
//
// `stat/device` lists every device adopted into the site. The whole
// inventory comes back in one response; there is no paging.

use tracing::debug;

use crate::auth::Session;
use crate::client::ControllerClient;
use crate::error::Error;
use crate::models::{Device, DeviceListResponse};

impl ControllerClient {
    /// List all devices in the configured site.
    ///
    /// `GET /api/s/{site}/stat/device`, authenticated with `session`.
    /// Devices are returned in controller order.
    pub async fn list_devices(&self, session: &Session) -> Result<Vec<Device>, Error> {
        let url = self.site_url("stat/device")?;
        debug!(site = %self.site(), "listing devices");

        let resp = session
            .apply(self.http().get(url))
            .send()
            .await
            .map_err(Error::Transport)?;

        let list: DeviceListResponse = Self::parse_json(resp).await?;

        if let Some(meta) = list.meta {
            if meta.rc != "ok" {
                return Err(Error::LegacyApi {
                    message: meta.msg.unwrap_or_else(|| format!("rc={}", meta.rc)),
                });
            }
        }

        debug!(count = list.data.len(), "devices listed");
        Ok(list.data)
    }
}
