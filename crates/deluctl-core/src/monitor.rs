// ── Statistics feed ──
//
// Read-only monitoring snapshot of the daemon: session transfer rates,
// per-torrent status, derived counts, and the live speed limits. A
// background task refreshes the snapshot on an interval and publishes
// it through a watch channel; the toggle entity and the CLI take
// read-only handles to this feed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use deluctl_api::{DelugeClient, SessionStatus, TorrentStatus, TransportConfig};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ConnectionProfile;
use crate::error::CoreError;
use crate::preset::Preset;

/// Torrent counts derived from the per-torrent status map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TorrentCounts {
    pub total: usize,
    pub downloading: usize,
    pub seeding: usize,
    /// Torrents with payload traffic in either direction.
    pub active: usize,
}

/// One complete monitoring snapshot. Fetched whole, never patched.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatsSnapshot {
    /// Session-wide rates (bytes/s) and peer counts.
    pub session: SessionStatus,
    /// Per-torrent status, keyed by torrent hash.
    pub torrents: HashMap<String, TorrentStatus>,
    pub counts: TorrentCounts,
    /// The daemon's live speed limits (KiB/s).
    pub limits: Preset,
    pub fetched_at: DateTime<Utc>,
}

impl StatsSnapshot {
    fn derive_counts(torrents: &HashMap<String, TorrentStatus>) -> TorrentCounts {
        let mut counts = TorrentCounts {
            total: torrents.len(),
            ..TorrentCounts::default()
        };
        for torrent in torrents.values() {
            match torrent.state.as_str() {
                "Downloading" => counts.downloading += 1,
                "Seeding" => counts.seeding += 1,
                _ => {}
            }
            if torrent.download_payload_rate > 0.0 || torrent.upload_payload_rate > 0.0 {
                counts.active += 1;
            }
        }
        counts
    }
}

/// Fetch one snapshot in a fresh session.
pub async fn fetch_snapshot(profile: &ConnectionProfile) -> Result<StatsSnapshot, CoreError> {
    let client = DelugeClient::new(&profile.host, profile.port, &TransportConfig::default())?;
    client.login(&profile.password).await?;

    let session = client.session_status().await?;
    let torrents = client.torrents_status().await?;
    let limits = Preset::from(client.speed_limits().await?);

    let counts = StatsSnapshot::derive_counts(&torrents);
    debug!(
        torrents = counts.total,
        download_rate = session.download_rate,
        upload_rate = session.upload_rate,
        "fetched statistics snapshot"
    );

    Ok(StatsSnapshot {
        session,
        torrents,
        counts,
        limits,
        fetched_at: Utc::now(),
    })
}

/// Read-only handle to the feed: `None` until the first fetch lands.
pub type StatsHandle = watch::Receiver<Option<Arc<StatsSnapshot>>>;

/// Background poller publishing [`StatsSnapshot`]s.
pub struct StatsFeed {
    rx: StatsHandle,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StatsFeed {
    /// Spawn the refresh task. The first fetch happens immediately,
    /// then every `interval`. Fetch failures are logged and the last
    /// good snapshot stays published.
    pub fn spawn(profile: ConnectionProfile, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(refresh_task(profile, interval, tx, cancel.child_token()));
        Self {
            rx,
            cancel,
            task: Mutex::new(Some(task)),
        }
    }

    /// A fresh read-only handle.
    pub fn subscribe(&self) -> StatsHandle {
        self.rx.clone()
    }

    /// The most recent snapshot, if any fetch has succeeded yet.
    pub fn latest(&self) -> Option<Arc<StatsSnapshot>> {
        self.rx.borrow().clone()
    }

    /// Stop the refresh task and wait for it to finish.
    pub async fn stop(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().await.take() {
            let _ = task.await;
        }
    }
}

async fn refresh_task(
    profile: ConnectionProfile,
    interval: Duration,
    tx: watch::Sender<Option<Arc<StatsSnapshot>>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("statistics feed stopped");
                break;
            }
            _ = ticker.tick() => {
                match fetch_snapshot(&profile).await {
                    Ok(snapshot) => {
                        let _ = tx.send(Some(Arc::new(snapshot)));
                    }
                    Err(err) => {
                        warn!(host = %profile.host, port = profile.port, error = %err,
                              "statistics refresh failed; keeping last snapshot");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn torrent(state: &str, down: f64, up: f64) -> TorrentStatus {
        serde_json::from_value(serde_json::json!({
            "state": state,
            "download_payload_rate": down,
            "upload_payload_rate": up,
        }))
        .expect("valid torrent status")
    }

    #[test]
    fn counts_split_by_state_and_activity() {
        let torrents: HashMap<String, TorrentStatus> = [
            ("a".to_owned(), torrent("Downloading", 1024.0, 0.0)),
            ("b".to_owned(), torrent("Seeding", 0.0, 2048.0)),
            ("c".to_owned(), torrent("Seeding", 0.0, 0.0)),
            ("d".to_owned(), torrent("Paused", 0.0, 0.0)),
        ]
        .into();

        let counts = StatsSnapshot::derive_counts(&torrents);
        assert_eq!(counts.total, 4);
        assert_eq!(counts.downloading, 1);
        assert_eq!(counts.seeding, 2);
        assert_eq!(counts.active, 2);
    }

    #[test]
    fn counts_for_empty_map() {
        assert_eq!(
            StatsSnapshot::derive_counts(&HashMap::new()),
            TorrentCounts::default()
        );
    }
}
