//! Regime states and their severity ordering.
//!
//! The ordered 0-3 scale ranks severity; `Recovery` sits outside that
//! ordering and is reachable only after emergency stabilization.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete classification of platform risk/stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeState {
    /// Nominal operation; adaptive subsystems run at full amplitude.
    Normal,

    /// Elevated risk; amplitudes tighten but functionality is retained.
    Heightened,

    /// Deliberate load-shedding of adaptive behavior.
    ControlledDegradation,

    /// Aggressive clamping to stabilize the platform.
    EmergencyStabilization,

    /// Post-emergency consolidation; exits only toward `Heightened`.
    Recovery,
}

impl RegimeState {
    /// All regimes, in ordinal order.
    pub const ALL: [RegimeState; 5] = [
        RegimeState::Normal,
        RegimeState::Heightened,
        RegimeState::ControlledDegradation,
        RegimeState::EmergencyStabilization,
        RegimeState::Recovery,
    ];

    /// Ordinal value (0-4) used in the published decision contract.
    pub fn ordinal(&self) -> u8 {
        match self {
            RegimeState::Normal => 0,
            RegimeState::Heightened => 1,
            RegimeState::ControlledDegradation => 2,
            RegimeState::EmergencyStabilization => 3,
            RegimeState::Recovery => 4,
        }
    }

    /// Position on the severity scale, if this regime participates in it.
    ///
    /// `Recovery` is not severity-ordered relative to the others and
    /// returns `None`.
    pub fn severity_ordinal(&self) -> Option<u8> {
        match self {
            RegimeState::Recovery => None,
            other => Some(other.ordinal()),
        }
    }

    /// Whether this regime marks instability (any severity ordinal >= 1).
    pub fn is_unstable(&self) -> bool {
        matches!(self.severity_ordinal(), Some(ord) if ord >= 1)
    }

    /// Canonical snake_case name, matching the serde representation.
    pub fn name(&self) -> &'static str {
        match self {
            RegimeState::Normal => "normal",
            RegimeState::Heightened => "heightened",
            RegimeState::ControlledDegradation => "controlled_degradation",
            RegimeState::EmergencyStabilization => "emergency_stabilization",
            RegimeState::Recovery => "recovery",
        }
    }
}

impl fmt::Display for RegimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `to` is a strict severity downgrade from `from`.
///
/// Only defined within the ordered 0-3 scale; any pair involving
/// `Recovery` is not a downgrade in this sense.
pub fn is_strict_downgrade(from: RegimeState, to: RegimeState) -> bool {
    match (from.severity_ordinal(), to.severity_ordinal()) {
        (Some(f), Some(t)) => t < f,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_are_total_and_stable() {
        let ordinals: Vec<u8> = RegimeState::ALL.iter().map(|r| r.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn recovery_is_not_severity_ordered() {
        assert_eq!(RegimeState::Recovery.severity_ordinal(), None);
        assert!(!is_strict_downgrade(RegimeState::Recovery, RegimeState::Normal));
        assert!(!is_strict_downgrade(
            RegimeState::EmergencyStabilization,
            RegimeState::Recovery
        ));
    }

    #[test]
    fn downgrade_requires_ordinal_decrease() {
        assert!(is_strict_downgrade(
            RegimeState::Heightened,
            RegimeState::Normal
        ));
        assert!(!is_strict_downgrade(
            RegimeState::Normal,
            RegimeState::Heightened
        ));
        assert!(!is_strict_downgrade(
            RegimeState::Heightened,
            RegimeState::Heightened
        ));
    }

    #[test]
    fn display_matches_serde_name() {
        for regime in RegimeState::ALL {
            let json = serde_json::to_string(&regime).unwrap();
            assert_eq!(json, format!("\"{}\"", regime));
        }
    }
}
