//! Clap derive structures for the `deluctl` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// deluctl -- bandwidth-preset toggle for the Deluge daemon
#[derive(Debug, Parser)]
#[command(
    name = "deluctl",
    version,
    about = "Toggle Deluge bandwidth presets from the command line",
    long_about = "Switches a Deluge daemon between two speed presets over its web\n\
        JSON-RPC interface: Preset 1 applies configured download/upload caps,\n\
        Preset 2 lifts them. A manually-set cap on the daemon is detected and\n\
        adopted as the new Preset 1.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Daemon profile to use
    #[arg(long, short = 'p', env = "DELUCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Web UI host (overrides profile)
    #[arg(long, env = "DELUCTL_HOST", global = true)]
    pub host: Option<String>,

    /// Web UI port (overrides profile)
    #[arg(long, env = "DELUCTL_PORT", global = true)]
    pub port: Option<u16>,

    /// Web UI password
    #[arg(long, env = "DELUCTL_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DELUCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show toggle position, live limits, and transfer statistics
    #[command(alias = "st")]
    Status,

    /// Switch to Preset 1 (limited)
    On,

    /// Switch to Preset 2 (unlimited)
    Off,

    /// Flip to the opposite preset
    Toggle,

    /// Apply explicit speed limits without changing the toggle position
    Set(SetArgs),

    /// Verify connectivity and authentication against the daemon
    Check,

    /// Continuously print transfer statistics until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SET
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Download cap in KiB/s (-1 = unlimited)
    #[arg(allow_negative_numbers = true, value_parser = rate_parser())]
    pub download: i64,

    /// Upload cap in KiB/s (-1 = unlimited)
    #[arg(allow_negative_numbers = true, value_parser = rate_parser())]
    pub upload: i64,
}

/// Rates are -1 (unlimited) or a non-negative KiB/s value.
fn rate_parser() -> clap::builder::RangedI64ValueParser<i64> {
    clap::value_parser!(i64).range(-1..)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (defaults to the profile's poll_interval)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Change a preset's rates in the active profile
    SetPreset {
        /// Which preset to change
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        preset: u8,

        /// Download cap in KiB/s (-1 = unlimited)
        #[arg(allow_negative_numbers = true, value_parser = rate_parser())]
        download: i64,

        /// Upload cap in KiB/s (-1 = unlimited)
        #[arg(allow_negative_numbers = true, value_parser = rate_parser())]
        upload: i64,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
