//! Command handlers and the dispatch table.

pub mod check;
pub mod config_cmd;
pub mod status;
pub mod switch;
pub mod watch;

use deluctl_core::ToggleConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a daemon-facing command. `Config` and `Completions` are
/// routed in `main` before a profile is resolved.
pub async fn dispatch(
    command: Command,
    config: ToggleConfig,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        Command::Status => status::handle(config, global).await,
        Command::On => switch::handle(switch::Action::On, config, profile_name, global).await,
        Command::Off => switch::handle(switch::Action::Off, config, profile_name, global).await,
        Command::Toggle => {
            switch::handle(switch::Action::Toggle, config, profile_name, global).await
        }
        Command::Set(args) => {
            let action = switch::Action::Set {
                download: args.download,
                upload: args.upload,
            };
            switch::handle(action, config, profile_name, global).await
        }
        Command::Check => check::handle(config, global).await,
        Command::Watch(args) => watch::handle(config, args.interval, global).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
