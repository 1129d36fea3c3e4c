//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use deluctl_config::ConfigError;
use deluctl_core::CoreError;

/// Exit codes for process termination.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to daemon at {endpoint}")]
    #[diagnostic(
        code(deluctl::connection_failed),
        help(
            "Check that the Deluge daemon is running and its web UI is reachable.\n\
             {reason}"
        )
    )]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Switching presets failed against {host}:{port}")]
    #[diagnostic(
        code(deluctl::switch_failed),
        help(
            "The daemon rejected every speed-set attempt; the toggle was left unchanged.\n\
             The failure detail is in the log line above. Try: deluctl check"
        )
    )]
    SwitchFailed { host: String, port: u16 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed for profile '{profile}'")]
    #[diagnostic(
        code(deluctl::auth_failed),
        help(
            "Verify the web UI password.\n\
             Run: deluctl config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(deluctl::no_credentials),
        help(
            "Configure a password with: deluctl config init\n\
             Or set the DELUCTL_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Daemon ───────────────────────────────────────────────────────
    #[error("Daemon error: {message}")]
    #[diagnostic(code(deluctl::daemon_error))]
    DaemonError { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(deluctl::timeout),
        help("The daemon accepted the connection but did not answer in time.")
    )]
    Timeout,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(deluctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(deluctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: deluctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(deluctl::config))]
    Config(Box<ConfigError>),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::SwitchFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { endpoint, reason } => {
                CliError::ConnectionFailed { endpoint, reason }
            }

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::Daemon { message } | CoreError::Protocol { message } => {
                CliError::DaemonError { message }
            }

            CoreError::SpeedSetFailed { attempts: _, message } => {
                CliError::DaemonError { message }
            }

            CoreError::Persistence { message } => CliError::DaemonError { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },

            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },

            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },

            other => CliError::Config(Box::new(other)),
        }
    }
}
