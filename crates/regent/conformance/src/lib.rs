//! Regent Conformance Suite
//!
//! Exercises the governor's hard guarantees as independent, self-contained
//! assertions: band partition, the recovery-path graph property, dwell
//! enforcement, topology membership of every accepted transition, the
//! advisory-only oscillation flag, query idempotence, and the scenario
//! catalog for the decision surface.
//!
//! Run with: `cargo test -p regent-conformance`

use chrono::Utc;
use regent_governor::{GovernorConfig, HysteresisConfig, TickStamp};
use regent_types::{RegimeState, SignalSnapshot};

/// Snapshot whose weighted composite score equals `target` exactly.
///
/// All four risk signals carry `target` and the continuity index carries
/// `1 - target`, so the weights collapse to the identity.
pub fn snapshot_with_score(target: f64) -> SignalSnapshot {
    SignalSnapshot {
        taken_at: Utc::now(),
        urf_composite_risk: target,
        mse_meta_instability: target,
        predictive_collapse_risk: target,
        consistency_gap: target,
        csi_continuity_index: 1.0 - target,
    }
}

/// Hysteresis configuration with the same minimum dwell for every regime.
pub fn uniform_dwell(seconds: f64) -> HysteresisConfig {
    let mut config = HysteresisConfig::default();
    for regime in RegimeState::ALL {
        config.min_duration_s.insert(regime, seconds);
    }
    config
}

/// Governor configuration with uniform dwell and a generous staleness
/// bound, for driving long scripted scenarios under paused time.
pub fn scenario_config(dwell_s: f64) -> GovernorConfig {
    GovernorConfig {
        staleness_bound_s: 3_600.0,
        hysteresis: uniform_dwell(dwell_s),
        ..GovernorConfig::default()
    }
}

/// Tick stamp at a chosen monotonic offset, for driving the hysteresis
/// controller directly.
pub fn stamp(mono_s: f64) -> TickStamp {
    TickStamp {
        mono_s: 0.0,
        wall: Utc::now(),
    }
    .offset(mono_s)
}
