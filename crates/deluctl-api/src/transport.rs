// Transport configuration for building reqwest::Client instances.
//
// Every session strategy (durable-jar, fresh-jar, jarless) funnels through
// this module so timeout and cookie policy live in one place.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

/// Default timeout for auth and inquiry calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Create a config with the given total per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            cookie_jar: None,
        }
    }

    /// Create a config with a fresh cookie jar (for session auth).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    /// Build a `reqwest::Client` from this config.
    ///
    /// The cookie jar, when present, is shared with the builder so the
    /// session cookie set by `auth.login` is replayed on later calls.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("deluctl/0.1.0");

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder.build().map_err(crate::error::Error::Transport)
    }
}
