// ── Toggle entity ──
//
// The externally observable on/off switch over the two presets.
// Cheaply clonable; a single mutex serializes every transition so at
// most one configuration change per instance is in flight. State is
// published through a watch channel so observers see changes without
// polling.
//
// Transitions never raise: a failed speed set downgrades to
// `available = false` plus a log entry, and the on/off bit only moves
// on success.

use std::fmt;
use std::sync::Arc;

use deluctl_api::{DelugeClient, TransportConfig};
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};

use crate::config::{AdaptPolicy, ConnectionProfile, SpeedPresets, ToggleConfig};
use crate::error::CoreError;
use crate::monitor::StatsHandle;
use crate::preset::{Preset, PresetKind, rate_label};
use crate::resolve;
use crate::setter::SpeedSetter;
use crate::store::PresetStore;

/// The externally observable entity state.
///
/// `available = false` means the last operation failed; it does not
/// mean `is_on` is stale, because the on/off bit only moves on a
/// successful set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ToggleState {
    pub is_on: bool,
    pub available: bool,
}

impl ToggleState {
    /// The preset this state believes is active.
    pub fn active_preset(&self) -> PresetKind {
        if self.is_on {
            PresetKind::Limited
        } else {
            PresetKind::Unlimited
        }
    }
}

impl Default for ToggleState {
    /// Initial state on attach, before the resolver refines it.
    fn default() -> Self {
        Self {
            is_on: false,
            available: true,
        }
    }
}

/// The bandwidth-preset toggle for one daemon.
///
/// Cheaply clonable via `Arc`. Construct with [`SpeedToggle::new`],
/// then call [`attach`](Self::attach) once to reconcile with the
/// daemon's live configuration.
#[derive(Clone)]
pub struct SpeedToggle {
    inner: Arc<ToggleInner>,
}

struct ToggleInner {
    profile: ConnectionProfile,
    adapt: AdaptPolicy,
    setter: SpeedSetter,
    /// Preset 1 is mutable (adaptive detection); the mutex doubles as
    /// the per-instance transition lock.
    presets: Mutex<SpeedPresets>,
    state: watch::Sender<ToggleState>,
    store: Option<Arc<dyn PresetStore>>,
    stats: Option<StatsHandle>,
}

impl SpeedToggle {
    pub fn new(config: ToggleConfig) -> Self {
        Self::with_dependencies(config, None, None)
    }

    /// Construct with the optional external dependencies: a store that
    /// persists an adapted Preset 1, and a read-only statistics feed
    /// for display attributes.
    pub fn with_dependencies(
        config: ToggleConfig,
        store: Option<Arc<dyn PresetStore>>,
        stats: Option<StatsHandle>,
    ) -> Self {
        let (state, _) = watch::channel(ToggleState::default());
        Self {
            inner: Arc::new(ToggleInner {
                profile: config.profile,
                adapt: config.adapt,
                setter: SpeedSetter::new(config.extended_fallbacks),
                presets: Mutex::new(config.presets),
                state,
                store,
                stats,
            }),
        }
    }

    pub fn profile(&self) -> &ConnectionProfile {
        &self.inner.profile
    }

    /// The current published state.
    pub fn state(&self) -> ToggleState {
        *self.inner.state.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ToggleState> {
        self.inner.state.subscribe()
    }

    /// The current presets (Preset 1 may have been adapted).
    pub async fn presets(&self) -> SpeedPresets {
        *self.inner.presets.lock().await
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Reconcile the toggle with the daemon's live configuration.
    ///
    /// Best-effort: when the daemon cannot be reached the entity is
    /// marked unavailable and keeps its prior on/off belief. When the
    /// live limits match neither preset but carry a cap, the snapshot
    /// is adopted as the new Preset 1 (under [`AdaptPolicy::Auto`])
    /// and persisted through the store, if one was attached.
    pub async fn attach(&self) {
        let mut presets = self.inner.presets.lock().await;

        let Some(resolution) = resolve::resolve(&self.inner.profile, &presets).await else {
            self.publish(|state| state.available = false);
            return;
        };

        if let Some(adapted) = resolution.adapted_limited {
            match self.inner.adapt {
                AdaptPolicy::Auto => {
                    info!(
                        %adapted,
                        previous = %presets.limited,
                        "adopting live speed limits as the limited preset"
                    );
                    presets.limited = adapted;
                    if let Some(ref store) = self.inner.store {
                        if let Err(err) = store.save_limited_preset(adapted) {
                            warn!(error = %err, "could not persist adapted preset");
                        }
                    }
                }
                AdaptPolicy::Off => {
                    info!(
                        live = %adapted,
                        configured = %presets.limited,
                        "live limits differ from the limited preset (adaptation disabled)"
                    );
                }
            }
        }

        self.publish(|state| {
            state.is_on = resolution.is_on;
            state.available = true;
        });
        info!(is_on = resolution.is_on, "toggle state reconciled with daemon");
    }

    // ── Transitions ──────────────────────────────────────────────────

    /// Switch to Preset 1 (limited). Never raises; failure shows up as
    /// `available = false`.
    pub async fn turn_on(&self) {
        self.transition(PresetKind::Limited).await;
    }

    /// Switch to Preset 2 (unlimited).
    pub async fn turn_off(&self) {
        self.transition(PresetKind::Unlimited).await;
    }

    /// Invoke the transition opposite to the current published state,
    /// returning the state afterwards.
    pub async fn toggle(&self) -> ToggleState {
        if self.state().is_on {
            self.turn_off().await;
        } else {
            self.turn_on().await;
        }
        self.state()
    }

    async fn transition(&self, kind: PresetKind) {
        let presets = self.inner.presets.lock().await;
        let target = match kind {
            PresetKind::Limited => presets.limited,
            PresetKind::Unlimited => presets.unlimited,
        };
        info!(%kind, %target, "switching preset");

        match self.inner.setter.apply(&self.inner.profile, target).await {
            Ok(()) => {
                self.publish(|state| {
                    state.is_on = kind == PresetKind::Limited;
                    state.available = true;
                });
                info!(%kind, "switched");
            }
            Err(err) => {
                error!(%kind, error = %err, "preset switch failed; marking unavailable");
                self.publish(|state| state.available = false);
            }
        }
    }

    /// Apply an arbitrary rate pair without changing which preset is
    /// considered active. Same soft-failure contract as the
    /// transitions.
    pub async fn set_speed(&self, download: i64, upload: i64) {
        let _presets = self.inner.presets.lock().await;
        let target = Preset::new(download, upload);
        info!(%target, "setting explicit speed limits");

        match self.inner.setter.apply(&self.inner.profile, target).await {
            Ok(()) => self.publish(|state| state.available = true),
            Err(err) => {
                error!(error = %err, "explicit speed set failed; marking unavailable");
                self.publish(|state| state.available = false);
            }
        }
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Authenticate and probe the daemon, returning a report.
    ///
    /// Unlike the transitions this propagates its errors: the caller
    /// is a human running a diagnostic, not an automation loop.
    pub async fn check_connection(&self) -> Result<ConnectionReport, CoreError> {
        let profile = &self.inner.profile;
        let client = DelugeClient::new(&profile.host, profile.port, &TransportConfig::default())?;
        client.login(&profile.password).await?;

        // The method-list probe is optional on older daemons.
        let methods = match client.method_list().await {
            Ok(list) => Some(list.len()),
            Err(err) => {
                warn!(error = %err, "method-list probe unsupported; falling back to config");
                None
            }
        };
        let limits = Preset::from(client.speed_limits().await?);

        Ok(ConnectionReport {
            endpoint: client.endpoint().to_string(),
            limits,
            methods,
        })
    }

    // ── Display attributes ───────────────────────────────────────────

    /// The attribute block shown alongside the switch: preset labels,
    /// the active preset, and live statistics when a feed is attached.
    pub async fn attributes(&self) -> ToggleAttributes {
        let presets = *self.inner.presets.lock().await;
        let state = self.state();
        let snapshot = self
            .inner
            .stats
            .as_ref()
            .and_then(|handle| handle.borrow().clone());

        let mut attrs = ToggleAttributes {
            preset_1_download: rate_label(presets.limited.download),
            preset_1_upload: rate_label(presets.limited.upload),
            preset_2_download: rate_label(presets.unlimited.download),
            preset_2_upload: rate_label(presets.unlimited.upload),
            current_preset: state.active_preset().to_string(),
            daemon_host: format!("{}:{}", self.inner.profile.host, self.inner.profile.port),
            download_rate: None,
            upload_rate: None,
            total_torrents: None,
            downloading_torrents: None,
            seeding_torrents: None,
            active_torrents: None,
        };

        if let Some(stats) = snapshot {
            attrs.download_rate = Some(stats.session.download_rate);
            attrs.upload_rate = Some(stats.session.upload_rate);
            attrs.total_torrents = Some(stats.counts.total);
            attrs.downloading_torrents = Some(stats.counts.downloading);
            attrs.seeding_torrents = Some(stats.counts.seeding);
            attrs.active_torrents = Some(stats.counts.active);
        }

        attrs
    }

    fn publish(&self, update: impl FnOnce(&mut ToggleState)) {
        self.inner.state.send_modify(update);
    }
}

/// Result of the connection diagnostic.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectionReport {
    pub endpoint: String,
    /// Live speed limits at probe time.
    pub limits: Preset,
    /// RPC method count, when the daemon supports the listing probe.
    pub methods: Option<usize>,
}

impl fmt::Display for ConnectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "daemon at {} is reachable and authenticated; live limits {}",
            self.endpoint, self.limits
        )?;
        if let Some(count) = self.methods {
            write!(f, "; {count} RPC methods exposed")?;
        }
        Ok(())
    }
}

/// Display attributes for one toggle, mirroring the switch's
/// attribute block: preset labels plus live statistics when a feed is
/// attached.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToggleAttributes {
    pub preset_1_download: String,
    pub preset_1_upload: String,
    pub preset_2_download: String,
    pub preset_2_upload: String,
    pub current_preset: String,
    pub daemon_host: String,
    /// Session rates in bytes/s, from the statistics feed.
    pub download_rate: Option<f64>,
    pub upload_rate: Option<f64>,
    pub total_torrents: Option<usize>,
    pub downloading_torrents: Option<usize>,
    pub seeding_torrents: Option<usize>,
    pub active_torrents: Option<usize>,
}
