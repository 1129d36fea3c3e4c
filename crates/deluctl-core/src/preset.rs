// ── Preset model ──
//
// A preset is a named (download, upload) rate pair in KiB/s with the
// daemon's -1 sentinel for "no cap". Two presets exist at any time:
// the limited one (toggle ON) and the unlimited one (toggle OFF).

use std::fmt;

use deluctl_api::SpeedLimits;
pub use deluctl_api::models::UNLIMITED;
use serde::{Deserialize, Serialize};

/// A (download, upload) rate pair in KiB/s. `-1` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub download: i64,
    pub upload: i64,
}

impl Preset {
    pub const fn new(download: i64, upload: i64) -> Self {
        Self { download, upload }
    }

    /// The fully uncapped preset.
    pub const fn unlimited() -> Self {
        Self::new(UNLIMITED, UNLIMITED)
    }

    /// `true` if either direction carries a cap.
    pub fn is_limited(&self) -> bool {
        self.download != UNLIMITED || self.upload != UNLIMITED
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", rate_label(self.download), rate_label(self.upload))
    }
}

impl From<SpeedLimits> for Preset {
    fn from(limits: SpeedLimits) -> Self {
        Self::new(limits.max_download_speed, limits.max_upload_speed)
    }
}

impl From<Preset> for SpeedLimits {
    fn from(preset: Preset) -> Self {
        SpeedLimits::new(preset.download, preset.upload)
    }
}

/// Which of the two presets a state refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresetKind {
    Limited,
    Unlimited,
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited => write!(f, "Preset 1 (Limited)"),
            Self::Unlimited => write!(f, "Preset 2 (Unlimited)"),
        }
    }
}

/// Human label for a single rate: `"500 KiB/s"` or `"Unlimited"`.
pub fn rate_label(rate: i64) -> String {
    if rate == UNLIMITED {
        "Unlimited".into()
    } else {
        format!("{rate} KiB/s")
    }
}
