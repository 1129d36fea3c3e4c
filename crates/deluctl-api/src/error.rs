use thiserror::Error;

/// Top-level error type for the `deluctl-api` crate.
///
/// Covers the four failure kinds the wire can produce: transport faults,
/// authentication rejections, structured daemon errors, and malformed
/// responses. `deluctl-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong password, or an unexpected auth response).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error (bad host or port in the connection profile).
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Daemon RPC ──────────────────────────────────────────────────
    /// The daemon answered with a populated `error` field, or the web
    /// endpoint returned a non-200 status for an RPC call.
    #[error("RPC error (HTTP {status}): {message}")]
    Rpc { status: u16, message: String },

    // ── Protocol ────────────────────────────────────────────────────
    /// Response body was not the expected JSON-RPC envelope.
    #[error("Protocol error: {message}")]
    Protocol { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is the daemon's "not authenticated" RPC
    /// error, the one signal that escalating to another auth strategy
    /// might succeed.
    pub fn is_not_authenticated(&self) -> bool {
        match self {
            Self::Rpc { message, .. } => message.to_lowercase().contains("not authenticated"),
            _ => false,
        }
    }

    /// Returns `true` if the daemon endpoint could not be reached at all
    /// (connection refused, DNS failure, or timeout).
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}
