//! Profile configuration for deluctl.
//!
//! TOML profiles, credential resolution (keyring + env + plaintext),
//! and translation to `deluctl_core::ToggleConfig`. Also home of the
//! [`TomlPresetStore`], which writes an adapted Preset 1 back into the
//! profile so it survives restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use deluctl_core::{
    AdaptPolicy, ConnectionProfile, CoreError, Preset, PresetStore, SpeedPresets, ToggleConfig,
    UNLIMITED,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("no profile named '{name}' in the config file")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named daemon profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a named profile.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A named daemon profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Web UI host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Web UI port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Web UI password (plaintext — prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Preset 1 download cap, KiB/s (-1 = unlimited).
    #[serde(default = "default_preset1_download")]
    pub preset1_download: i64,

    /// Preset 1 upload cap, KiB/s.
    #[serde(default = "default_preset1_upload")]
    pub preset1_upload: i64,

    /// Preset 2 download cap, KiB/s.
    #[serde(default = "default_unlimited")]
    pub preset2_download: i64,

    /// Preset 2 upload cap, KiB/s.
    #[serde(default = "default_unlimited")]
    pub preset2_upload: i64,

    /// Whether a manually-set cap is adopted as Preset 1.
    #[serde(default)]
    pub adapt: AdaptPolicy,

    /// Statistics refresh interval, seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Enable the delayed-retry and fresh-session fallbacks when a
    /// speed set hits an authentication error.
    #[serde(default)]
    pub extended_fallbacks: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: None,
            password_env: None,
            preset1_download: default_preset1_download(),
            preset1_upload: default_preset1_upload(),
            preset2_download: default_unlimited(),
            preset2_upload: default_unlimited(),
            adapt: AdaptPolicy::default(),
            poll_interval: default_poll_interval(),
            extended_fallbacks: false,
        }
    }
}

fn default_host() -> String {
    "localhost".into()
}
fn default_port() -> u16 {
    8112
}
fn default_preset1_download() -> i64 {
    500
}
fn default_preset1_upload() -> i64 {
    100
}
fn default_unlimited() -> i64 {
    UNLIMITED
}
fn default_poll_interval() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "deluctl", "deluctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("deluctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load a Config from an explicit file path + environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DELUCTL_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(&config_path(), cfg)
}

/// Write a Config to an explicit path. Writes a sibling temp file and
/// renames it into place so a crash never leaves a truncated config.
pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, toml_str)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the web UI password for a profile.
///
/// Chain: `DELUCTL_PASSWORD` env var, the profile's `password_env`
/// variable, the system keyring, then the plaintext `password` field.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Ok(pw) = std::env::var("DELUCTL_PASSWORD") {
        return Ok(SecretString::from(pw));
    }

    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok(SecretString::from(pw));
        }
    }

    if let Ok(entry) = keyring::Entry::new("deluctl", &format!("{profile_name}/password")) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a password in the system keyring under the profile's entry.
pub fn store_password_in_keyring(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new("deluctl", &format!("{profile_name}/password"))?;
    entry.set_password(password)?;
    Ok(())
}

// ── Translation to core types ───────────────────────────────────────

/// Build a `ToggleConfig` from a profile — no CLI flag overrides.
pub fn profile_to_toggle_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ToggleConfig, ConfigError> {
    let presets = SpeedPresets {
        limited: validated_preset(
            "preset1",
            profile.preset1_download,
            profile.preset1_upload,
        )?,
        unlimited: validated_preset(
            "preset2",
            profile.preset2_download,
            profile.preset2_upload,
        )?,
    };

    let password = resolve_password(profile, profile_name)?;

    Ok(ToggleConfig {
        profile: ConnectionProfile {
            host: profile.host.clone(),
            port: profile.port,
            password,
        },
        presets,
        adapt: profile.adapt,
        extended_fallbacks: profile.extended_fallbacks,
        poll_interval_secs: profile.poll_interval,
    })
}

fn validated_preset(field: &str, download: i64, upload: i64) -> Result<Preset, ConfigError> {
    for (dir, rate) in [("download", download), ("upload", upload)] {
        if rate < UNLIMITED {
            return Err(ConfigError::Validation {
                field: format!("{field}_{dir}"),
                reason: format!("rate must be -1 (unlimited) or a non-negative KiB/s, got {rate}"),
            });
        }
    }
    Ok(Preset::new(download, upload))
}

// ── Preset persistence ──────────────────────────────────────────────

/// Writes an adapted Preset 1 back into one profile of a TOML config
/// file, via load-modify-save. A missing file or profile entry is
/// created with defaults.
#[derive(Debug)]
pub struct TomlPresetStore {
    path: PathBuf,
    profile: String,
}

impl TomlPresetStore {
    pub fn new(path: PathBuf, profile: impl Into<String>) -> Self {
        Self {
            path,
            profile: profile.into(),
        }
    }

    /// Store against the canonical config path.
    pub fn at_default_path(profile: impl Into<String>) -> Self {
        Self::new(config_path(), profile)
    }

    fn persist(&self, preset: Preset) -> Result<(), ConfigError> {
        // Read the file directly rather than through figment: env-var
        // overlays must not be written back to disk.
        let mut cfg: Config = if self.path.exists() {
            toml::from_str(&std::fs::read_to_string(&self.path)?)?
        } else {
            Config::default()
        };

        let entry = cfg.profiles.entry(self.profile.clone()).or_default();
        entry.preset1_download = preset.download;
        entry.preset1_upload = preset.upload;

        save_config_to(&self.path, &cfg)
    }
}

impl PresetStore for TomlPresetStore {
    fn save_limited_preset(&self, preset: Preset) -> Result<(), CoreError> {
        self.persist(preset).map_err(|err| CoreError::Persistence {
            message: err.to_string(),
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn sample_profile() -> Profile {
        Profile {
            host: "nas.local".into(),
            port: 8113,
            password: Some("deluge-pass".into()),
            preset1_download: 750,
            preset1_upload: 150,
            ..Profile::default()
        }
    }

    #[test]
    fn save_and_reload_round_trips_a_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("nas".into(), sample_profile());
        save_config_to(&path, &cfg).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let profile = loaded.profile("nas").unwrap();
        assert_eq!(profile.host, "nas.local");
        assert_eq!(profile.port, 8113);
        assert_eq!(profile.preset1_download, 750);
        assert_eq!(profile.preset2_download, UNLIMITED);
        assert_eq!(profile.adapt, AdaptPolicy::Auto);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.default_profile.as_deref(), Some("default"));
        assert!(loaded.profiles.is_empty());
        assert_eq!(loaded.defaults.output, "table");
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.profile("nope"),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn plaintext_password_resolves_when_nothing_else_is_set() {
        let profile = sample_profile();
        let secret = resolve_password(&profile, "toml-store-plain").unwrap();
        assert_eq!(secret.expose_secret(), "deluge-pass");
    }

    #[test]
    fn missing_credentials_are_an_error() {
        let profile = Profile::default();
        assert!(matches!(
            resolve_password(&profile, "toml-store-none"),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn profile_maps_onto_toggle_config() {
        let toggle = profile_to_toggle_config(&sample_profile(), "nas").unwrap();
        assert_eq!(toggle.profile.host, "nas.local");
        assert_eq!(toggle.profile.port, 8113);
        assert_eq!(toggle.presets.limited, Preset::new(750, 150));
        assert_eq!(toggle.presets.unlimited, Preset::unlimited());
        assert_eq!(toggle.poll_interval_secs, 30);
        assert!(!toggle.extended_fallbacks);
    }

    #[test]
    fn rates_below_the_sentinel_are_rejected() {
        let profile = Profile {
            preset1_download: -2,
            ..sample_profile()
        };
        let err = profile_to_toggle_config(&profile, "nas").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. }
            if field == "preset1_download"));
    }

    #[test]
    fn preset_store_rewrites_preset1_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert("nas".into(), sample_profile());
        save_config_to(&path, &cfg).unwrap();

        let store = TomlPresetStore::new(path.clone(), "nas");
        store.save_limited_preset(Preset::new(1200, 300)).unwrap();

        let reloaded = load_config_from(&path).unwrap();
        let profile = reloaded.profile("nas").unwrap();
        assert_eq!(profile.preset1_download, 1200);
        assert_eq!(profile.preset1_upload, 300);
        // Untouched fields survive the rewrite.
        assert_eq!(profile.host, "nas.local");
        assert_eq!(profile.password.as_deref(), Some("deluge-pass"));
    }

    #[test]
    fn preset_store_creates_missing_file_and_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.toml");

        let store = TomlPresetStore::new(path.clone(), "new-box");
        store.save_limited_preset(Preset::new(640, 64)).unwrap();

        let reloaded = load_config_from(&path).unwrap();
        let profile = reloaded.profile("new-box").unwrap();
        assert_eq!(profile.preset1_download, 640);
        assert_eq!(profile.host, "localhost");
    }
}
