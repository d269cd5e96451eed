//! Transition records and the per-tick decision contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::regime::RegimeState;

/// Reason codes attached to every hysteresis decision.
///
/// Rejections are expected outcomes of normal operation, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Proposal equals the current regime; nothing to do.
    NoChange,

    /// Transition accepted and recorded.
    RegimeShift,

    /// The edge is not in the transition topology.
    ForbiddenTopology,

    /// The current regime's minimum dwell time has not elapsed.
    MinimumDurationNotMet,

    /// Recovery may only step down through heightened, never straight
    /// to normal.
    RecoveryStepdownRequired,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DecisionReason::NoChange => "no_change",
            DecisionReason::RegimeShift => "regime_shift",
            DecisionReason::ForbiddenTopology => "forbidden_topology",
            DecisionReason::MinimumDurationNotMet => "minimum_duration_not_met",
            DecisionReason::RecoveryStepdownRequired => "recovery_stepdown_required",
        };
        f.write_str(name)
    }
}

/// One accepted regime transition, immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Strictly increasing sequence number, starting at 1.
    pub sequence_no: u64,

    /// Regime the governor left.
    pub from_regime: RegimeState,

    /// Regime the governor entered.
    pub to_regime: RegimeState,

    /// Wall-clock timestamp of the transition, derived from the
    /// monotonic stream so it cannot move backward.
    pub at: DateTime<Utc>,

    /// How long the governor dwelt in `from_regime`, in seconds.
    pub duration_in_from_s: f64,

    /// Human-readable trigger description (e.g. the classified score).
    pub reason: String,
}

/// Outcome of a single hysteresis decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeDecision {
    /// Whether the proposed transition was accepted.
    pub allowed: bool,

    /// The regime in effect after this decision.
    pub effective_regime: RegimeState,

    /// Why the decision came out this way.
    pub reason: DecisionReason,

    /// Dwell time in the current regime at decision time, seconds.
    pub current_duration_s: f64,

    /// Configured minimum dwell for the current regime, seconds.
    pub min_duration_s: f64,

    /// Seconds of dwell still required before a transition may be
    /// accepted; zero when the minimum is already met.
    pub time_remaining_s: f64,

    /// Advisory: recent transition churn crossed the oscillation
    /// threshold. Never changes the allow/reject outcome.
    pub oscillation_detected: bool,

    /// Advisory: accepted transitions inside the oscillation window.
    pub oscillation_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_serialize_snake_case() {
        let json = serde_json::to_string(&DecisionReason::MinimumDurationNotMet).unwrap();
        assert_eq!(json, "\"minimum_duration_not_met\"");
    }

    #[test]
    fn record_round_trips_through_json() {
        let record = TransitionRecord {
            sequence_no: 1,
            from_regime: RegimeState::Normal,
            to_regime: RegimeState::Heightened,
            at: Utc::now(),
            duration_in_from_s: 12.5,
            reason: "score 0.3400 classified heightened".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: TransitionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
