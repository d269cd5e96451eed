//! Regime classification over the composite score.
//!
//! Classification only ever produces a *proposal*; the hysteresis
//! controller decides whether a proposal becomes the effective regime.

use regent_types::{is_strict_downgrade, RegimeScore, RegimeState};

/// Lower band threshold for `Heightened`.
pub const HEIGHTENED_THRESHOLD: f64 = 0.30;

/// Lower band threshold for `ControlledDegradation`.
pub const CONTROLLED_DEGRADATION_THRESHOLD: f64 = 0.50;

/// Lower band threshold for `EmergencyStabilization`.
pub const EMERGENCY_STABILIZATION_THRESHOLD: f64 = 0.70;

/// Lower band threshold for `Recovery`.
pub const RECOVERY_THRESHOLD: f64 = 0.85;

/// Map a score to the regime whose band contains it.
///
/// Bands are closed on the left and open on the right; the final band is
/// closed on both ends, so the five bands partition `[0, 1]` with no gaps
/// or overlaps.
pub fn classify(score: RegimeScore) -> RegimeState {
    let s = score.value();
    if s < HEIGHTENED_THRESHOLD {
        RegimeState::Normal
    } else if s < CONTROLLED_DEGRADATION_THRESHOLD {
        RegimeState::Heightened
    } else if s < EMERGENCY_STABILIZATION_THRESHOLD {
        RegimeState::ControlledDegradation
    } else if s < RECOVERY_THRESHOLD {
        RegimeState::EmergencyStabilization
    } else {
        RegimeState::Recovery
    }
}

/// Lower threshold of a regime's score band.
pub fn lower_threshold(regime: RegimeState) -> f64 {
    match regime {
        RegimeState::Normal => 0.0,
        RegimeState::Heightened => HEIGHTENED_THRESHOLD,
        RegimeState::ControlledDegradation => CONTROLLED_DEGRADATION_THRESHOLD,
        RegimeState::EmergencyStabilization => EMERGENCY_STABILIZATION_THRESHOLD,
        RegimeState::Recovery => RECOVERY_THRESHOLD,
    }
}

/// Apply the downgrade-margin deadband to a classified proposal.
///
/// A strict severity downgrade is only generated when the score sits at
/// least `margin` below the current regime's lower threshold; otherwise
/// the proposal collapses to the current regime and the tick is treated
/// as "no change". Recovery exits are not margin-gated; they are governed
/// by the explicit step-down rule in the hysteresis controller.
pub fn filter_downgrade(
    current: RegimeState,
    proposed: RegimeState,
    score: RegimeScore,
    margin: f64,
) -> RegimeState {
    if !is_strict_downgrade(current, proposed) {
        return proposed;
    }
    if score.value() <= lower_threshold(current) - margin {
        proposed
    } else {
        current
    }
}
