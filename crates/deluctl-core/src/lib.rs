//! Core logic for the Deluge bandwidth-preset toggle.
//!
//! Builds on `deluctl-api`'s session client: preset classification
//! ([`resolve`]), the escalating speed-set strategy chain ([`setter`]),
//! the toggle entity itself ([`toggle`]), and the read-only statistics
//! feed ([`monitor`]). Consumers construct a [`ToggleConfig`] and hand
//! it in whole; nothing here reads config files or global state.

pub mod config;
pub mod error;
pub mod monitor;
pub mod preset;
pub mod resolve;
pub mod setter;
pub mod store;
pub mod toggle;

pub use config::{AdaptPolicy, ConnectionProfile, SpeedPresets, ToggleConfig};
pub use deluctl_api::{SessionStatus, TorrentStatus};
pub use error::CoreError;
pub use monitor::{StatsFeed, StatsHandle, StatsSnapshot, TorrentCounts};
pub use preset::{Preset, PresetKind, UNLIMITED};
pub use resolve::{Classification, Resolution, classify, resolve};
pub use setter::{SpeedSetter, Strategy};
pub use store::{MemoryPresetStore, PresetStore};
pub use toggle::{ConnectionReport, SpeedToggle, ToggleAttributes, ToggleState};
