// ── Core error types ──
//
// User-facing errors from deluctl-core. These are NOT wire-specific --
// consumers never see HTTP status codes or JSON parse failures directly.
// The `From<deluctl_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to daemon at {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Daemon request timed out")]
    Timeout,

    // ── Daemon errors ────────────────────────────────────────────────
    #[error("Daemon error: {message}")]
    Daemon { message: String },

    #[error("Unexpected daemon response: {message}")]
    Protocol { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// Final consolidated failure after the speed-set escalation chain
    /// is exhausted. `attempts` counts every strategy attempt made.
    #[error("Failed to set speed limits after {attempts} attempt(s): {message}")]
    SpeedSetFailed { attempts: usize, message: String },

    // ── Persistence errors ───────────────────────────────────────────
    /// The external preset store rejected an adapted-preset save.
    #[error("Could not persist adapted preset: {message}")]
    Persistence { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<deluctl_api::Error> for CoreError {
    fn from(err: deluctl_api::Error) -> Self {
        match err {
            deluctl_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            deluctl_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else {
                    CoreError::ConnectionFailed {
                        endpoint: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                }
            }
            deluctl_api::Error::InvalidUrl(e) => CoreError::ConnectionFailed {
                endpoint: String::new(),
                reason: format!("invalid URL: {e}"),
            },
            deluctl_api::Error::Rpc { message, .. } => CoreError::Daemon { message },
            deluctl_api::Error::Protocol { message, body: _ } => CoreError::Protocol { message },
        }
    }
}
