//! Preset switching: `on`, `off`, `toggle`, and explicit `set`.

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde::Serialize;

use deluctl_config::TomlPresetStore;
use deluctl_core::preset::rate_label;
use deluctl_core::{Preset, PresetStore, SpeedToggle, ToggleConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// What the user asked the toggle to do.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    On,
    Off,
    Toggle,
    Set { download: i64, upload: i64 },
}

/// JSON / table view of the toggle after a transition.
#[derive(Debug, Serialize)]
struct SwitchView {
    is_on: bool,
    active_preset: String,
    download: String,
    upload: String,
}

pub async fn handle(
    action: Action,
    config: ToggleConfig,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let host = config.profile.host.clone();
    let port = config.profile.port;

    let store: Arc<dyn PresetStore> = Arc::new(TomlPresetStore::at_default_path(profile_name));
    let toggle = SpeedToggle::with_dependencies(config, Some(store), None);

    // Reconcile with the daemon first so `toggle` flips from the real
    // position and a drifted cap is adopted before switching away.
    toggle.attach().await;

    let applied = match action {
        Action::On => {
            toggle.turn_on().await;
            None
        }
        Action::Off => {
            toggle.turn_off().await;
            None
        }
        Action::Toggle => {
            toggle.toggle().await;
            None
        }
        Action::Set { download, upload } => {
            toggle.set_speed(download, upload).await;
            Some(Preset::new(download, upload))
        }
    };

    let state = toggle.state();
    if !state.available {
        return Err(CliError::SwitchFailed { host, port });
    }

    let presets = toggle.presets().await;
    let shown = applied.unwrap_or(if state.is_on {
        presets.limited
    } else {
        presets.unlimited
    });

    let view = SwitchView {
        is_on: state.is_on,
        active_preset: state.active_preset().to_string(),
        download: rate_label(shown.download),
        upload: rate_label(shown.upload),
    };

    let color = output::should_color(global.color);
    let rendered = output::render_single(
        global.output,
        &view,
        |v| detail(v, color),
        |v| if v.is_on { "on".into() } else { "off".into() },
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn detail(view: &SwitchView, color: bool) -> String {
    let position = if view.is_on { "ON" } else { "OFF" };
    let position = if color {
        if view.is_on {
            position.green().to_string()
        } else {
            position.cyan().to_string()
        }
    } else {
        position.to_string()
    };
    format!(
        "Toggle: {position} ({})\nLimits: {} down / {} up",
        view.active_preset, view.download, view.upload
    )
}
