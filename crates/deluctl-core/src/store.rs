// ── Preset persistence seam ──
//
// Adaptive detection can overwrite Preset 1 at runtime; the overwrite
// should survive a restart. Where it lands (TOML profile, platform
// config entry) is the caller's business, so the toggle only sees this
// trait.

use std::sync::Mutex;

use crate::error::CoreError;
use crate::preset::Preset;

/// External store for the mutable "limited" preset.
///
/// Implementations must be cheap enough to call from an async context;
/// a failed save is reported but never blocks the toggle itself.
pub trait PresetStore: Send + Sync {
    fn save_limited_preset(&self, preset: Preset) -> Result<(), CoreError>;
}

/// In-memory store for tests and ephemeral runs (nothing survives the
/// process).
#[derive(Debug, Default)]
pub struct MemoryPresetStore {
    saved: Mutex<Option<Preset>>,
}

impl MemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last preset saved, if any.
    pub fn saved(&self) -> Option<Preset> {
        self.saved.lock().map(|g| *g).unwrap_or(None)
    }
}

impl PresetStore for MemoryPresetStore {
    fn save_limited_preset(&self, preset: Preset) -> Result<(), CoreError> {
        let mut guard = self.saved.lock().map_err(|_| CoreError::Persistence {
            message: "preset store mutex poisoned".into(),
        })?;
        *guard = Some(preset);
        Ok(())
    }
}
