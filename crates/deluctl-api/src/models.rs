// Daemon-facing data types
//
// Models for the slices of daemon state this crate reads and writes.
// Rate fields use a lenient numeric deserializer because the daemon is
// inconsistent about integer vs float encoding (`-1` vs `-1.0`).

use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel rate meaning "no bandwidth cap".
pub const UNLIMITED: i64 = -1;

/// The two speed-limit fields of the daemon configuration, in KiB/s.
///
/// This is both the fetched snapshot (`core.get_config`, unknown fields
/// ignored) and the write payload (`core.set_config`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedLimits {
    #[serde(default = "unlimited", deserialize_with = "lenient_i64")]
    pub max_download_speed: i64,
    #[serde(default = "unlimited", deserialize_with = "lenient_i64")]
    pub max_upload_speed: i64,
}

impl SpeedLimits {
    pub fn new(max_download_speed: i64, max_upload_speed: i64) -> Self {
        Self {
            max_download_speed,
            max_upload_speed,
        }
    }
}

/// Session-wide transfer statistics from `core.get_session_status`.
///
/// Rates are bytes per second, unlike the KiB/s config limits.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SessionStatus {
    #[serde(default)]
    pub download_rate: f64,
    #[serde(default)]
    pub upload_rate: f64,
    #[serde(default)]
    pub num_peers: i64,
    #[serde(default)]
    pub dht_nodes: i64,
}

/// Per-torrent status slice from `core.get_torrents_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentStatus {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: String,
    /// Completion percentage, 0.0 to 100.0.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub download_payload_rate: f64,
    #[serde(default)]
    pub upload_payload_rate: f64,
    /// Seconds until completion; 0 when unknown or finished.
    #[serde(default, deserialize_with = "lenient_i64")]
    pub eta: i64,
    #[serde(default)]
    pub ratio: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub time_added: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_size: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_done: i64,
    /// Queue position; -1 when not queued.
    #[serde(default = "unlimited", deserialize_with = "lenient_i64")]
    pub queue: i64,
}

fn unlimited() -> i64 {
    UNLIMITED
}

/// Accept integer or float JSON numbers, truncating toward zero.
#[allow(clippy::cast_possible_truncation)]
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.trunc() as i64)
}
