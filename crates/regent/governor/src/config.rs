//! Governor configuration: defaults, loading, wholesale validation.
//!
//! Configuration is loaded once at startup and validated as a whole;
//! there are no partial defaults resolved at call time. A hot reload, if
//! a host ever wants one, replaces the entire object atomically.

use std::collections::HashMap;

use regent_types::{
    AmplitudeProfile, Bounds, RegimeState, EMOTION_MULTIPLIER_ENVELOPE, ETA_SCALE_ENVELOPE,
    SENSITIVITY_MULTIPLIER_ENVELOPE,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Timing and margin thresholds for the hysteresis controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HysteresisConfig {
    /// Minimum dwell per regime, in seconds, before any transition out
    /// of it may be accepted.
    pub min_duration_s: HashMap<RegimeState, f64>,

    /// How far below the current band's lower threshold the score must
    /// sit before a severity downgrade is proposed at all.
    pub downgrade_margin: f64,

    /// Rolling window for the oscillation advisory, in seconds.
    pub oscillation_window_s: f64,

    /// Accepted transitions within the window that trip the advisory.
    pub oscillation_threshold: u32,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        let mut min_duration_s = HashMap::new();
        min_duration_s.insert(RegimeState::Normal, 60.0);
        min_duration_s.insert(RegimeState::Heightened, 300.0);
        min_duration_s.insert(RegimeState::ControlledDegradation, 300.0);
        min_duration_s.insert(RegimeState::EmergencyStabilization, 600.0);
        min_duration_s.insert(RegimeState::Recovery, 900.0);

        Self {
            min_duration_s,
            downgrade_margin: 0.05,
            oscillation_window_s: 600.0,
            oscillation_threshold: 4,
        }
    }
}

impl HysteresisConfig {
    /// Minimum dwell for a regime. The table is validated to cover every
    /// regime at startup, so a miss can only mean an unvalidated config.
    pub fn min_duration_for(&self, regime: RegimeState) -> f64 {
        self.min_duration_s.get(&regime).copied().unwrap_or(0.0)
    }

    /// Validate the whole object. Fatal on any violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for regime in RegimeState::ALL {
            let duration = self
                .min_duration_s
                .get(&regime)
                .copied()
                .ok_or(ConfigError::MissingRegime(regime))?;
            if !duration.is_finite() || duration < 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "min_duration_s[{regime}] must be finite and non-negative, got {duration}"
                )));
            }
        }
        if !self.downgrade_margin.is_finite() || !(0.0..=1.0).contains(&self.downgrade_margin) {
            return Err(ConfigError::InvalidValue(format!(
                "downgrade_margin must lie in [0, 1], got {}",
                self.downgrade_margin
            )));
        }
        if !self.oscillation_window_s.is_finite() || self.oscillation_window_s <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "oscillation_window_s must be positive, got {}",
                self.oscillation_window_s
            )));
        }
        if self.oscillation_threshold == 0 {
            return Err(ConfigError::InvalidValue(
                "oscillation_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-regime amplitude profiles, keyed by regime name when serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmplitudeConfig {
    /// Profile table; every regime must be present.
    pub profiles: HashMap<RegimeState, AmplitudeProfile>,
}

impl Default for AmplitudeConfig {
    fn default() -> Self {
        let mut profiles = HashMap::new();
        profiles.insert(
            RegimeState::Normal,
            AmplitudeProfile {
                eta_scale: Bounds::new(0.25, 1.0),
                emotion_multiplier: Bounds::new(0.5, 1.0),
                sensitivity_multiplier: Bounds::fixed(1.0),
            },
        );
        profiles.insert(
            RegimeState::Heightened,
            AmplitudeProfile {
                eta_scale: Bounds::new(0.25, 0.85),
                emotion_multiplier: Bounds::new(0.5, 0.9),
                sensitivity_multiplier: Bounds::new(1.1, 1.3),
            },
        );
        profiles.insert(
            RegimeState::ControlledDegradation,
            AmplitudeProfile {
                eta_scale: Bounds::new(0.25, 0.6),
                emotion_multiplier: Bounds::new(0.5, 0.75),
                sensitivity_multiplier: Bounds::new(1.2, 1.4),
            },
        );
        profiles.insert(
            RegimeState::EmergencyStabilization,
            AmplitudeProfile {
                eta_scale: Bounds::fixed(0.25),
                emotion_multiplier: Bounds::fixed(0.5),
                sensitivity_multiplier: Bounds::fixed(1.5),
            },
        );
        profiles.insert(
            RegimeState::Recovery,
            AmplitudeProfile {
                eta_scale: Bounds::new(0.25, 0.5),
                emotion_multiplier: Bounds::new(0.5, 0.8),
                sensitivity_multiplier: Bounds::new(1.0, 1.2),
            },
        );

        Self { profiles }
    }
}

impl AmplitudeConfig {
    /// Validate every profile against the safety envelope and the
    /// unstable-regime invariants. Fatal on any violation; amplitudes
    /// are never clamped at request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for regime in RegimeState::ALL {
            let profile = self
                .profiles
                .get(&regime)
                .ok_or(ConfigError::MissingRegime(regime))?;

            for (field, bounds, envelope) in [
                ("eta_scale", profile.eta_scale, ETA_SCALE_ENVELOPE),
                (
                    "emotion_multiplier",
                    profile.emotion_multiplier,
                    EMOTION_MULTIPLIER_ENVELOPE,
                ),
                (
                    "sensitivity_multiplier",
                    profile.sensitivity_multiplier,
                    SENSITIVITY_MULTIPLIER_ENVELOPE,
                ),
            ] {
                if !bounds.is_well_formed() {
                    return Err(ConfigError::MalformedBounds {
                        regime,
                        field,
                        detail: format!("min {} max {}", bounds.min, bounds.max),
                    });
                }
                if !bounds.is_within(&envelope) {
                    return Err(ConfigError::EnvelopeViolation {
                        regime,
                        field,
                        detail: format!("{bounds} outside {envelope}"),
                    });
                }
            }

            // Restated independently of the envelope: unstable regimes
            // must never accelerate learning or dull detection.
            if regime.is_unstable() {
                if profile.eta_scale.max > 1.0 {
                    return Err(ConfigError::UnstableRegimeInvariant {
                        regime,
                        detail: format!("eta_scale max {} exceeds 1.0", profile.eta_scale.max),
                    });
                }
                if profile.sensitivity_multiplier.min < 1.0 {
                    return Err(ConfigError::UnstableRegimeInvariant {
                        regime,
                        detail: format!(
                            "sensitivity_multiplier min {} below 1.0",
                            profile.sensitivity_multiplier.min
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Top-level governor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Evaluation tick interval, seconds.
    pub tick_interval_s: f64,

    /// Maximum snapshot age before the governor degrades, seconds.
    pub staleness_bound_s: f64,

    /// Bounded capacity of the publication channel; lagging consumers
    /// drop the oldest events rather than stalling evaluation.
    pub event_capacity: usize,

    /// Hysteresis thresholds.
    pub hysteresis: HysteresisConfig,

    /// Amplitude profile table.
    pub amplitude: AmplitudeConfig,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            tick_interval_s: 1.0,
            staleness_bound_s: 5.0,
            event_capacity: 256,
            hysteresis: HysteresisConfig::default(),
            amplitude: AmplitudeConfig::default(),
        }
    }
}

impl GovernorConfig {
    /// Parse a JSON configuration document and validate it wholesale.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: GovernorConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the whole object. Fatal on any violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_interval_s.is_finite() || self.tick_interval_s <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "tick_interval_s must be positive, got {}",
                self.tick_interval_s
            )));
        }
        if !self.staleness_bound_s.is_finite() || self.staleness_bound_s <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "staleness_bound_s must be positive, got {}",
                self.staleness_bound_s
            )));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        self.hysteresis.validate()?;
        self.amplitude.validate()?;
        Ok(())
    }
}
