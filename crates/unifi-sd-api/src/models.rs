// Controller response types
//
// `stat/device` returns 100+ fields per device; only the four the discovery
// document needs are modelled. Controllers and test fixtures disagree on key
// casing (`data` vs `Data` vs `DATA`, `ip` vs `Ip` vs `IP`), so the lower,
// capitalized and upper-case spellings are accepted. Mixed forms like `nAmE`
// are not.
// Absent or null fields decode to empty values.

use serde::{Deserialize, Deserializer};

/// Response body of `GET /api/s/{site}/stat/device`.
///
/// ```json
/// { "meta": { "rc": "ok" }, "data": [...] }
/// ```
#[derive(Debug, Deserialize)]
pub struct DeviceListResponse {
    #[serde(default)]
    pub meta: Option<Meta>,
    #[serde(default, alias = "Data", alias = "DATA", deserialize_with = "null_as_default")]
    pub data: Vec<Device>,
}

/// Metadata from the legacy envelope. `rc` == `"ok"` means success.
#[derive(Debug, Deserialize)]
pub struct Meta {
    pub rc: String,
    #[serde(default)]
    pub msg: Option<String>,
}

/// One managed device from the controller inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Device {
    #[serde(default, alias = "Name", alias = "NAME", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, alias = "Ip", alias = "IP", deserialize_with = "null_as_default")]
    pub ip: String,
    #[serde(
        default,
        rename = "type",
        alias = "Type",
        alias = "TYPE",
        deserialize_with = "null_as_default"
    )]
    pub device_type: String,
    #[serde(default, alias = "Model", alias = "MODEL", deserialize_with = "null_as_default")]
    pub model: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
