//! CLI-side configuration glue: profile selection and flag overrides.
//!
//! `deluctl-config` owns the TOML format and credential chain; this
//! module layers the CLI flags on top and is the single boundary where
//! config types become a `deluctl_core::ToggleConfig`.

use secrecy::SecretString;

use deluctl_config::{Config, Profile, load_config_or_default, profile_to_toggle_config};
use deluctl_core::ToggleConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the `ToggleConfig` for the active profile, with CLI overrides.
///
/// A profile named explicitly with `--profile` must exist; the implicit
/// default profile falls back to built-in defaults (localhost:8112) so
/// flag-only invocations work without a config file.
pub fn resolve_toggle_config(global: &GlobalOpts) -> Result<(String, ToggleConfig), CliError> {
    let cfg = load_config_or_default();
    let name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name,
                available: available.join(", "),
            });
        }
        None => Profile::default(),
    };

    if let Some(ref host) = global.host {
        profile.host.clone_from(host);
    }
    if let Some(port) = global.port {
        profile.port = port;
    }

    let toggle_config = profile_to_toggle_config_with_flag(&profile, &name, global)?;
    Ok((name, toggle_config))
}

/// Like `profile_to_toggle_config`, but a `--password` flag wins over
/// every step of the credential chain.
fn profile_to_toggle_config_with_flag(
    profile: &Profile,
    name: &str,
    global: &GlobalOpts,
) -> Result<ToggleConfig, CliError> {
    if let Some(ref password) = global.password {
        let mut with_flag = profile.clone();
        with_flag.password = Some(password.clone());
        let mut config = profile_to_toggle_config(&with_flag, name)?;
        config.profile.password = SecretString::from(password.clone());
        return Ok(config);
    }
    Ok(profile_to_toggle_config(profile, name)?)
}
