// ── Speed-set strategy chain ──
//
// Applying `core.set_config` through the web endpoint is flaky on some
// daemon setups: a freshly authenticated session can still answer
// "Not authenticated" on the next call. The setter models the known
// workarounds as an ordered chain of strategies and walks it until one
// succeeds. Only the not-authenticated marker moves the chain forward;
// every other daemon error is final.

use std::time::Duration;

use deluctl_api::{DelugeClient, Error as ApiError, TransportConfig};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::config::ConnectionProfile;
use crate::error::CoreError;
use crate::preset::Preset;

/// Timeout for the primary speed-set path. More generous than the
/// inquiry timeout because `core.set_config` can stall on busy daemons.
pub const SET_SPEED_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the fallback rungs.
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(15);

/// Base backoff between repeated attempts of one strategy.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Total wall-clock budget for one `apply` across every rung.
const MAX_WALL_CLOCK: Duration = Duration::from_secs(90);

/// One way of pushing a preset to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One durable-cookie session: authenticate, then set, with the
    /// generous timeout. The normal path.
    Direct,
    /// Same shape as `Direct` but with a short settle delay between
    /// login and write, for daemons that register the session lazily.
    DelayedRetry,
    /// A brand-new session per attempt, tried twice with backoff.
    FreshSession,
    /// Authenticate-then-set with no cookie jar at all. Some daemon
    /// deployments accept this when session cookies misbehave.
    AlternateAuth,
}

impl Strategy {
    /// How many times this rung is attempted before moving on.
    fn max_attempts(self) -> u32 {
        match self {
            Self::FreshSession => 2,
            _ => 1,
        }
    }

    /// One authenticate-then-set cycle in this strategy's style.
    async fn attempt(self, profile: &ConnectionProfile, target: Preset) -> Result<(), ApiError> {
        let (transport, settle) = match self {
            Self::Direct => (
                TransportConfig::with_timeout(SET_SPEED_TIMEOUT).with_cookie_jar(),
                None,
            ),
            Self::DelayedRetry => (
                TransportConfig::with_timeout(FALLBACK_TIMEOUT).with_cookie_jar(),
                Some(Duration::from_millis(200)),
            ),
            Self::FreshSession => (
                TransportConfig::default().with_cookie_jar(),
                Some(Duration::from_millis(50)),
            ),
            // No jar: from_transport keeps the transport cookie-free.
            Self::AlternateAuth => (TransportConfig::with_timeout(FALLBACK_TIMEOUT), None),
        };

        let client = DelugeClient::from_transport(&profile.host, profile.port, &transport)?;
        client.login(&profile.password).await?;
        if let Some(delay) = settle {
            sleep(delay).await;
        }
        client.set_speed_limits(target.into()).await
    }
}

/// Applies a target preset through the strategy chain.
#[derive(Debug, Clone)]
pub struct SpeedSetter {
    chain: Vec<Strategy>,
}

impl Default for SpeedSetter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl SpeedSetter {
    /// Build the default chain, or the extended one with the delayed
    /// and fresh-session rungs inserted before the alternate-auth
    /// last resort.
    pub fn new(extended: bool) -> Self {
        let chain = if extended {
            vec![
                Strategy::Direct,
                Strategy::DelayedRetry,
                Strategy::FreshSession,
                Strategy::AlternateAuth,
            ]
        } else {
            vec![Strategy::Direct, Strategy::AlternateAuth]
        };
        Self { chain }
    }

    /// The rungs in escalation order.
    pub fn chain(&self) -> &[Strategy] {
        &self.chain
    }

    /// Push `target` to the daemon, escalating through the chain.
    ///
    /// Success means the daemon's live limits now equal `target`. No
    /// local state is touched; the caller updates its own belief only
    /// after this returns `Ok`.
    ///
    /// Escalation is one-directional and happens only on the daemon's
    /// "not authenticated" answer. Any other daemon error fails
    /// immediately with the daemon's message; connection-level failures
    /// fail with the consolidated guidance text.
    pub async fn apply(&self, profile: &ConnectionProfile, target: Preset) -> Result<(), CoreError> {
        let deadline = Instant::now() + MAX_WALL_CLOCK;
        let mut attempts = 0usize;
        let mut rungs = self.chain.iter().copied().peekable();

        while let Some(strategy) = rungs.next() {
            let max = strategy.max_attempts();
            for attempt in 1..=max {
                attempts += 1;
                debug!(?strategy, attempt, %target, "applying speed preset");

                match strategy.attempt(profile, target).await {
                    Ok(()) => {
                        info!(?strategy, %target, "speed preset applied");
                        return Ok(());
                    }
                    Err(err) if err.is_not_authenticated() => {
                        if attempt < max && Instant::now() < deadline {
                            warn!(?strategy, attempt, "daemon reports not authenticated; retrying");
                            sleep(RETRY_BACKOFF * attempt).await;
                            continue;
                        }
                        if rungs.peek().is_some() && Instant::now() < deadline {
                            warn!(?strategy, "daemon reports not authenticated; escalating");
                            break;
                        }
                        return Err(consolidated(attempts, profile, &err));
                    }
                    Err(err @ ApiError::Rpc { .. }) => {
                        error!(?strategy, %err, "daemon rejected the speed change");
                        return Err(CoreError::SpeedSetFailed {
                            attempts,
                            message: err.to_string(),
                        });
                    }
                    Err(err) => {
                        if attempt < max && Instant::now() < deadline {
                            warn!(?strategy, attempt, %err, "attempt failed; retrying");
                            sleep(RETRY_BACKOFF * attempt).await;
                            continue;
                        }
                        error!(?strategy, %err, "speed-set attempt failed");
                        return Err(consolidated(attempts, profile, &err));
                    }
                }
            }
        }

        Err(consolidated(
            attempts,
            profile,
            &ApiError::Authentication {
                message: "every connection strategy was exhausted".into(),
            },
        ))
    }
}

/// The final, user-actionable failure once the chain gives up.
fn consolidated(attempts: usize, profile: &ConnectionProfile, err: &ApiError) -> CoreError {
    CoreError::SpeedSetFailed {
        attempts,
        message: format!(
            "{err}. Verify that the Deluge daemon is running, the web UI is \
             reachable at http://{}:{}, the password is correct, and no \
             firewall is blocking the connection",
            profile.host, profile.port
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_chain_is_direct_then_alternate() {
        let setter = SpeedSetter::new(false);
        assert_eq!(setter.chain(), [Strategy::Direct, Strategy::AlternateAuth]);
    }

    #[test]
    fn extended_chain_inserts_fallbacks_before_alternate() {
        let setter = SpeedSetter::new(true);
        assert_eq!(
            setter.chain(),
            [
                Strategy::Direct,
                Strategy::DelayedRetry,
                Strategy::FreshSession,
                Strategy::AlternateAuth,
            ]
        );
    }

    #[test]
    fn only_fresh_session_repeats() {
        assert_eq!(Strategy::Direct.max_attempts(), 1);
        assert_eq!(Strategy::DelayedRetry.max_attempts(), 1);
        assert_eq!(Strategy::FreshSession.max_attempts(), 2);
        assert_eq!(Strategy::AlternateAuth.max_attempts(), 1);
    }
}
