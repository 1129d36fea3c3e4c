// ── Runtime toggle configuration ──
//
// These types describe *how* to reach one daemon and which presets the
// toggle switches between. They carry credential data and tuning, but
// never touch disk. The CLI constructs a `ToggleConfig` and hands it in.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::preset::Preset;

/// Where the daemon's web endpoint lives and how to authenticate.
///
/// Immutable for the lifetime of one toggle instance; the instance owns
/// its copy exclusively.
#[derive(Debug, Clone)]
pub struct ConnectionProfile {
    pub host: String,
    pub port: u16,
    /// The web UI password (the daemon's only credential).
    pub password: SecretString,
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 8112,
            password: SecretString::from(String::new()),
        }
    }
}

/// The two presets the toggle switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedPresets {
    /// Preset 1, active when the toggle is ON. Mutable at runtime
    /// (adaptive detection may overwrite it).
    pub limited: Preset,
    /// Preset 2, active when the toggle is OFF. Fixed from configuration.
    pub unlimited: Preset,
}

impl Default for SpeedPresets {
    fn default() -> Self {
        Self {
            limited: Preset::new(500, 100),
            unlimited: Preset::unlimited(),
        }
    }
}

/// Whether an unrecognized live configuration is adopted as Preset 1.
///
/// `Auto` preserves the integration's historical behavior: a manual cap
/// set outside the toggle becomes the new "limited" preset and is
/// persisted. `Off` still classifies such a cap as toggle-ON but leaves
/// Preset 1 untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdaptPolicy {
    #[default]
    Auto,
    Off,
}

/// Configuration for one toggle instance.
///
/// Built by the CLI from its profile store and passed in whole -- core
/// never reads config files and keeps no global registry.
#[derive(Debug, Clone)]
pub struct ToggleConfig {
    pub profile: ConnectionProfile,
    pub presets: SpeedPresets,
    pub adapt: AdaptPolicy,
    /// Insert the delayed-retry and fresh-session rungs into the
    /// speed-set escalation chain.
    pub extended_fallbacks: bool,
    /// Statistics feed refresh interval (seconds).
    pub poll_interval_secs: u64,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            profile: ConnectionProfile::default(),
            presets: SpeedPresets::default(),
            adapt: AdaptPolicy::default(),
            extended_fallbacks: false,
            poll_interval_secs: 30,
        }
    }
}
