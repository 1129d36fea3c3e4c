//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use deluctl_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password_in_keyring,
};
use deluctl_core::UNLIMITED;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::active_profile_name;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the password.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        let _ = writeln!(out, "port = {}", p.port);
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        let _ = writeln!(out, "preset1_download = {}", p.preset1_download);
        let _ = writeln!(out, "preset1_upload = {}", p.preset1_upload);
        let _ = writeln!(out, "preset2_download = {}", p.preset2_download);
        let _ = writeln!(out, "preset2_upload = {}", p.preset2_upload);
        let _ = writeln!(out, "poll_interval = {}", p.poll_interval);
        let _ = writeln!(out, "extended_fallbacks = {}", p.extended_fallbacks);
    }

    out.trim_end().to_string()
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_rate(field: &str, value: &str) -> Result<i64, CliError> {
    let rate: i64 = value.trim().parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("expected a number, got '{value}'"),
    })?;
    if rate < UNLIMITED {
        return Err(CliError::Validation {
            field: field.into(),
            reason: format!("rate must be -1 (unlimited) or a non-negative KiB/s, got {rate}"),
        });
    }
    Ok(rate)
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let path = config_path();
            eprintln!("deluctl — configuration wizard");
            eprintln!("   Config path: {}\n", path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let host: String = Input::new()
                .with_prompt("Deluge web UI host")
                .default("localhost".into())
                .interact_text()
                .map_err(prompt_err)?;

            let port: u16 = Input::new()
                .with_prompt("Deluge web UI port")
                .default(8112)
                .interact_text()
                .map_err(prompt_err)?;

            let pass = rpassword::prompt_password("Web UI password: ").map_err(prompt_err)?;
            if pass.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }

            let choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let selection = Select::new()
                .with_prompt("Where to store the password?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let password_field = if selection == 0 {
                store_password_in_keyring(&profile_name, &pass)?;
                eprintln!("   Password stored in system keyring");
                None
            } else {
                Some(pass)
            };

            let preset1_download = parse_rate(
                "preset1_download",
                &Input::<String>::new()
                    .with_prompt("Preset 1 download cap, KiB/s (-1 = unlimited)")
                    .default("500".into())
                    .interact_text()
                    .map_err(prompt_err)?,
            )?;
            let preset1_upload = parse_rate(
                "preset1_upload",
                &Input::<String>::new()
                    .with_prompt("Preset 1 upload cap, KiB/s (-1 = unlimited)")
                    .default("100".into())
                    .interact_text()
                    .map_err(prompt_err)?,
            )?;

            let extended = Confirm::new()
                .with_prompt("Enable extended speed-set fallbacks (delayed retry + fresh session)?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;

            let mut cfg = load_config_or_default();
            let is_first = cfg.profiles.is_empty();
            cfg.profiles.insert(
                profile_name.clone(),
                Profile {
                    host,
                    port,
                    password: password_field,
                    preset1_download,
                    preset1_upload,
                    extended_fallbacks: extended,
                    ..Profile::default()
                },
            );
            if is_first {
                cfg.default_profile = Some(profile_name.clone());
            }
            save_config(&cfg)?;

            eprintln!("\n   Profile '{profile_name}' written to {}", path.display());
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = load_config_or_default();
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Use: set default profile ────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: available.join(", "),
                });
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("Default profile set to '{name}'");
            Ok(())
        }

        // ── SetPreset: change preset rates in the active profile ────
        ConfigCommand::SetPreset {
            preset,
            download,
            upload,
        } => {
            for (field, rate) in [("download", download), ("upload", upload)] {
                if rate < UNLIMITED {
                    return Err(CliError::Validation {
                        field: field.into(),
                        reason: format!(
                            "rate must be -1 (unlimited) or a non-negative KiB/s, got {rate}"
                        ),
                    });
                }
            }

            let mut cfg = load_config_or_default();
            let name = active_profile_name(global, &cfg);
            let Some(profile) = cfg.profiles.get_mut(&name) else {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name,
                    available: available.join(", "),
                });
            };

            if preset == 1 {
                profile.preset1_download = download;
                profile.preset1_upload = upload;
            } else {
                profile.preset2_download = download;
                profile.preset2_upload = upload;
            }
            save_config(&cfg)?;
            eprintln!("Preset {preset} of '{name}' set to {download} / {upload} KiB/s");
            Ok(())
        }

        // ── SetPassword: store in keyring ───────────────────────────
        ConfigCommand::SetPassword { profile } => {
            let cfg = load_config_or_default();
            let name = profile.unwrap_or_else(|| active_profile_name(global, &cfg));

            let pass = rpassword::prompt_password("Web UI password: ").map_err(prompt_err)?;
            if pass.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            store_password_in_keyring(&name, &pass)?;
            eprintln!("Password for '{name}' stored in system keyring");
            Ok(())
        }
    }
}
