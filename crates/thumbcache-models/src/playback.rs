//! Types shared by the playback resolver and the generator.

use serde::{Deserialize, Serialize};

/// A playable media URL resolved for a video, plus the frame rate needed to
/// round a requested offset down to the nearest real frame.
#[derive(Debug, Clone)]
pub struct PlaybackUrl {
    pub url: String,
    pub fps: f64,
    pub is_live: bool,
}

/// An egress proxy, optionally tagged with a country code for error logs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyInfo {
    pub url: String,
    pub country_code: Option<String>,
}
