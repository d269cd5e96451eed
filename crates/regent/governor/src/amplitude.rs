//! Amplitude scaling: the validated regime -> profile lookup.

use regent_types::{
    AmplitudeProfile, RegimeState, EMOTION_MULTIPLIER_ENVELOPE, ETA_SCALE_ENVELOPE,
    SENSITIVITY_MULTIPLIER_ENVELOPE,
};

use crate::config::AmplitudeConfig;
use crate::error::ConfigError;

/// Per-regime amplitude lookup, validated once at construction.
///
/// After construction the lookup is total and infallible; a violating
/// configuration never produces a scaler at all.
#[derive(Debug, Clone)]
pub struct AmplitudeScaler {
    // Indexed by regime ordinal; presence of all five is enforced by
    // construction.
    profiles: [AmplitudeProfile; 5],
}

impl AmplitudeScaler {
    /// Build from configuration, enforcing the global safety envelope
    /// and the unstable-regime invariants. Fatal on violation.
    pub fn from_config(config: &AmplitudeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut profiles = [AmplitudeProfile {
            eta_scale: ETA_SCALE_ENVELOPE,
            emotion_multiplier: EMOTION_MULTIPLIER_ENVELOPE,
            sensitivity_multiplier: SENSITIVITY_MULTIPLIER_ENVELOPE,
        }; 5];
        for regime in RegimeState::ALL {
            let profile = config
                .profiles
                .get(&regime)
                .copied()
                .ok_or(ConfigError::MissingRegime(regime))?;
            profiles[regime.ordinal() as usize] = profile;
        }
        Ok(Self { profiles })
    }

    /// Amplitude profile for a regime.
    pub fn profile_for(&self, regime: RegimeState) -> AmplitudeProfile {
        self.profiles[regime.ordinal() as usize]
    }
}
