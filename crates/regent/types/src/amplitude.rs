//! Amplitude profiles: bounded multiplier sets published per regime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Global safety envelope for `eta_scale`.
pub const ETA_SCALE_ENVELOPE: Bounds = Bounds { min: 0.25, max: 1.0 };

/// Global safety envelope for `emotion_multiplier`.
pub const EMOTION_MULTIPLIER_ENVELOPE: Bounds = Bounds { min: 0.5, max: 1.0 };

/// Global safety envelope for `sensitivity_multiplier`.
pub const SENSITIVITY_MULTIPLIER_ENVELOPE: Bounds = Bounds { min: 1.0, max: 1.5 };

/// A closed numeric range; a fixed value is expressed as `min == max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Inclusive lower bound.
    pub min: f64,

    /// Inclusive upper bound.
    pub max: f64,
}

impl Bounds {
    /// Range with distinct endpoints.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Degenerate range pinning a single value.
    pub fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Whether the endpoints are finite and ordered.
    pub fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Whether this range nests entirely inside `outer`.
    pub fn is_within(&self, outer: &Bounds) -> bool {
        self.min >= outer.min && self.max <= outer.max
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "[{}, {}]", self.min, self.max)
        }
    }
}

/// Bounded multiplier set consumers apply in a given regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeProfile {
    /// Learning-rate scaling range.
    pub eta_scale: Bounds,

    /// Emotional-responsiveness multiplier range.
    pub emotion_multiplier: Bounds,

    /// Anomaly-detection sensitivity multiplier range.
    pub sensitivity_multiplier: Bounds,
}

impl AmplitudeProfile {
    /// Whether every sub-range nests inside the global safety envelope.
    pub fn is_within_envelope(&self) -> bool {
        self.eta_scale.is_within(&ETA_SCALE_ENVELOPE)
            && self
                .emotion_multiplier
                .is_within(&EMOTION_MULTIPLIER_ENVELOPE)
            && self
                .sensitivity_multiplier
                .is_within(&SENSITIVITY_MULTIPLIER_ENVELOPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_bounds_are_degenerate() {
        let b = Bounds::fixed(0.8);
        assert!(b.is_well_formed());
        assert_eq!(b.min, b.max);
    }

    #[test]
    fn inverted_bounds_are_malformed() {
        assert!(!Bounds::new(0.9, 0.3).is_well_formed());
        assert!(!Bounds::new(f64::NAN, 1.0).is_well_formed());
    }

    #[test]
    fn envelope_containment() {
        let profile = AmplitudeProfile {
            eta_scale: Bounds::new(0.5, 0.9),
            emotion_multiplier: Bounds::fixed(0.8),
            sensitivity_multiplier: Bounds::new(1.0, 1.2),
        };
        assert!(profile.is_within_envelope());

        let escaped = AmplitudeProfile {
            eta_scale: Bounds::new(0.5, 1.2),
            ..profile
        };
        assert!(!escaped.is_within_envelope());
    }
}
