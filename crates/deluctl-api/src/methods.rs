// Typed daemon RPC wrappers
//
// Config reads and writes plus the read-only status inquiries. Each
// wrapper pins down the params shape and the result type for one method.

use std::collections::HashMap;

use serde_json::json;
use tracing::debug;

use crate::client::DelugeClient;
use crate::error::Error;
use crate::models::{SessionStatus, SpeedLimits, TorrentStatus};

/// Session statistics requested from `core.get_session_status`.
const SESSION_STATUS_KEYS: [&str; 4] = ["download_rate", "upload_rate", "num_peers", "dht_nodes"];

/// Per-torrent fields requested from `core.get_torrents_status`.
const TORRENT_STATUS_KEYS: [&str; 12] = [
    "name",
    "state",
    "progress",
    "download_payload_rate",
    "upload_payload_rate",
    "eta",
    "ratio",
    "label",
    "time_added",
    "total_size",
    "total_done",
    "queue",
];

impl DelugeClient {
    /// Fetch the daemon's current speed limits.
    ///
    /// `core.get_config` returns the whole configuration map; everything
    /// but the two limit fields is discarded.
    pub async fn speed_limits(&self) -> Result<SpeedLimits, Error> {
        self.call("core.get_config", json!([])).await
    }

    /// Write both speed limits in one call.
    ///
    /// `core.set_config` acknowledges with `result: null`.
    pub async fn set_speed_limits(&self, limits: SpeedLimits) -> Result<(), Error> {
        debug!(
            download = limits.max_download_speed,
            upload = limits.max_upload_speed,
            "setting speed limits"
        );
        let _: Option<serde_json::Value> =
            self.call("core.set_config", json!([limits])).await?;
        Ok(())
    }

    /// Fetch session-wide transfer statistics.
    pub async fn session_status(&self) -> Result<SessionStatus, Error> {
        self.call("core.get_session_status", json!([SESSION_STATUS_KEYS]))
            .await
    }

    /// Fetch the status slice for every torrent, keyed by torrent hash.
    pub async fn torrents_status(&self) -> Result<HashMap<String, TorrentStatus>, Error> {
        self.call("core.get_torrents_status", json!([{}, TORRENT_STATUS_KEYS]))
            .await
    }

    /// List the RPC methods the daemon exposes.
    ///
    /// Used by the connection diagnostic as a cheap post-login probe.
    pub async fn method_list(&self) -> Result<Vec<String>, Error> {
        self.call("daemon.get_method_list", json!([])).await
    }
}
