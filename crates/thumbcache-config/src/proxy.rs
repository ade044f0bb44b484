//! A statically-configured egress proxy entry.

use serde::Deserialize;
use thumbcache_models::ProxyInfo;

#[derive(Debug, Clone, Deserialize)]
pub struct ProxyEntry {
    pub url: String,
    #[serde(default)]
    pub country_code: Option<String>,
}

impl From<ProxyEntry> for ProxyInfo {
    fn from(entry: ProxyEntry) -> Self {
        ProxyInfo {
            url: entry.url,
            country_code: entry.country_code,
        }
    }
}
