// ── Preset resolution ──
//
// Reconciles the toggle's on/off belief with the daemon's live speed
// limits. The classification is a pure function; the I/O wrapper around
// it is best-effort and swallows every failure, because a daemon that
// cannot be reached at attach time must not take the toggle down with it.

use deluctl_api::{DelugeClient, TransportConfig};
use tracing::{debug, warn};

use crate::config::{ConnectionProfile, SpeedPresets};
use crate::error::CoreError;
use crate::preset::Preset;

/// Where a live snapshot falls relative to the two presets.
///
/// The four cases are exhaustive and mutually exclusive: exact matches
/// first (Preset 1 wins if both presets are configured identically),
/// then drift split on whether anything is still capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Exactly Preset 1: the toggle is ON.
    MatchesLimited,
    /// Exactly Preset 2: the toggle is OFF.
    MatchesUnlimited,
    /// Matches neither but carries a cap: the user's real "limited"
    /// intent, carried as the adoption candidate for Preset 1.
    DriftLimited(Preset),
    /// Matches neither and fully uncapped: treated as OFF.
    DriftUnlimited,
}

impl Classification {
    /// The on/off belief this classification implies.
    pub fn is_on(&self) -> bool {
        matches!(self, Self::MatchesLimited | Self::DriftLimited(_))
    }

    /// The snapshot to adopt as the new Preset 1, when drift was capped.
    pub fn adoption(&self) -> Option<Preset> {
        match self {
            Self::DriftLimited(preset) => Some(*preset),
            _ => None,
        }
    }
}

/// Classify a live snapshot against the two presets.
pub fn classify(snapshot: Preset, presets: &SpeedPresets) -> Classification {
    if snapshot == presets.limited {
        Classification::MatchesLimited
    } else if snapshot == presets.unlimited {
        Classification::MatchesUnlimited
    } else if snapshot.is_limited() {
        Classification::DriftLimited(snapshot)
    } else {
        Classification::DriftUnlimited
    }
}

/// What the resolver hands back to the toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub is_on: bool,
    /// Set when the live snapshot should overwrite Preset 1.
    pub adapted_limited: Option<Preset>,
}

/// Fetch the daemon's live limits and classify them.
///
/// Returns `None` on any failure -- this is a best-effort reconciliation,
/// not a hard dependency, so errors are logged and dropped and the caller
/// keeps its prior state.
pub async fn resolve(profile: &ConnectionProfile, presets: &SpeedPresets) -> Option<Resolution> {
    match try_resolve(profile, presets).await {
        Ok(resolution) => Some(resolution),
        Err(err) => {
            warn!(host = %profile.host, port = profile.port, error = %err,
                  "preset detection failed; keeping prior state");
            None
        }
    }
}

async fn try_resolve(
    profile: &ConnectionProfile,
    presets: &SpeedPresets,
) -> Result<Resolution, CoreError> {
    let client = DelugeClient::new(&profile.host, profile.port, &TransportConfig::default())?;
    client.login(&profile.password).await?;

    let snapshot = Preset::from(client.speed_limits().await?);
    let classification = classify(snapshot, presets);
    debug!(
        snapshot = %snapshot,
        ?classification,
        "classified live speed limits"
    );

    Ok(Resolution {
        is_on: classification.is_on(),
        adapted_limited: classification.adoption(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::UNLIMITED;

    fn presets() -> SpeedPresets {
        SpeedPresets {
            limited: Preset::new(500, 100),
            unlimited: Preset::unlimited(),
        }
    }

    #[test]
    fn exact_limited_match_is_on_without_adoption() {
        let c = classify(Preset::new(500, 100), &presets());
        assert_eq!(c, Classification::MatchesLimited);
        assert!(c.is_on());
        assert_eq!(c.adoption(), None);
    }

    #[test]
    fn exact_unlimited_match_is_off() {
        let c = classify(Preset::unlimited(), &presets());
        assert_eq!(c, Classification::MatchesUnlimited);
        assert!(!c.is_on());
    }

    #[test]
    fn capped_drift_is_on_and_adopted() {
        let c = classify(Preset::new(200, 50), &presets());
        assert_eq!(c, Classification::DriftLimited(Preset::new(200, 50)));
        assert!(c.is_on());
        assert_eq!(c.adoption(), Some(Preset::new(200, 50)));
    }

    #[test]
    fn half_capped_drift_still_counts_as_limited() {
        let c = classify(Preset::new(UNLIMITED, 80), &presets());
        assert_eq!(c, Classification::DriftLimited(Preset::new(UNLIMITED, 80)));
        assert!(c.is_on());
    }

    #[test]
    fn uncapped_drift_is_off() {
        // Possible when Preset 2 is configured with actual caps.
        let custom = SpeedPresets {
            limited: Preset::new(500, 100),
            unlimited: Preset::new(1000, 1000),
        };
        let c = classify(Preset::unlimited(), &custom);
        assert_eq!(c, Classification::DriftUnlimited);
        assert!(!c.is_on());
    }

    #[test]
    fn limited_preset_wins_when_presets_collide() {
        let collided = SpeedPresets {
            limited: Preset::new(500, 100),
            unlimited: Preset::new(500, 100),
        };
        let c = classify(Preset::new(500, 100), &collided);
        assert_eq!(c, Classification::MatchesLimited);
    }

    #[test]
    fn exactly_one_class_per_snapshot() {
        let p = presets();
        for snapshot in [
            Preset::new(500, 100),
            Preset::unlimited(),
            Preset::new(200, 50),
            Preset::new(UNLIMITED, 80),
            Preset::new(500, 101),
        ] {
            let c = classify(snapshot, &p);
            let classes = [
                c == Classification::MatchesLimited,
                c == Classification::MatchesUnlimited,
                matches!(c, Classification::DriftLimited(_)),
                c == Classification::DriftUnlimited,
            ];
            assert_eq!(
                classes.iter().filter(|hit| **hit).count(),
                1,
                "snapshot {snapshot} classified ambiguously"
            );
        }
    }
}
