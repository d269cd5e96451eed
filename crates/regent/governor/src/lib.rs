//! # Regent Governor - Operational Regime Governance Runtime
//!
//! This crate implements the control loop that continuously classifies
//! platform risk/stability from five independent signals and gates how
//! aggressively adaptive subsystems may behave in each regime.
//!
//! ## Overview
//!
//! Each evaluation tick flows through a fixed pipeline:
//!
//! 1. the freshest [`SignalSnapshot`](regent_types::SignalSnapshot) is
//!    read from the single-slot ingress (stale input degrades the
//!    governor instead of fabricating readings),
//! 2. the weighted composite score is classified into a *proposed*
//!    regime by [`classifier`],
//! 3. the [`hysteresis`] controller decides whether the proposal may
//!    become effective, consulting the [`topology`] of legal transitions
//!    and the minimum-dwell clock,
//! 4. accepted transitions are appended to the append-only [`ledger`],
//! 5. the [`amplitude`] table maps the effective regime to its bounded
//!    multiplier profile, and the result is broadcast to consumers.
//!
//! ## Hard guarantees
//!
//! - No transition is accepted before the current regime's minimum
//!   dwell has elapsed.
//! - Forbidden direct transitions are rejected unconditionally; every
//!   regime keeps a directed path back to `normal`.
//! - Published amplitudes always sit inside the global safety envelope;
//!   a violating configuration dies at startup, never at request time.
//! - Ledger ordering is a hard invariant: a non-monotonic append halts
//!   evaluation rather than silently reordering history.
//!
//! ## Example
//!
//! ```rust,no_run
//! use regent_governor::{Governor, GovernorConfig};
//! use regent_types::SignalSnapshot;
//!
//! # fn example() -> regent_governor::GovernorResult<()> {
//! let mut governor = Governor::new(GovernorConfig::default())?;
//! let ingress = governor.ingress();
//!
//! ingress.offer(SignalSnapshot::quiescent());
//! if let Some(decision) = governor.tick()? {
//!     println!("regime: {}", decision.effective_regime);
//! }
//! # Ok(())
//! # }
//! ```

pub mod amplitude;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod governor;
pub mod hysteresis;
pub mod ledger;
pub mod topology;

// Re-export main types
pub use amplitude::AmplitudeScaler;
pub use clock::{GovernorClock, TickStamp};
pub use config::{AmplitudeConfig, GovernorConfig, HysteresisConfig};
pub use error::{ConfigError, GovernorError, GovernorResult, LedgerError};
pub use governor::{Governor, GovernorEvent, GovernorState, GovernorStatus, SnapshotIngress};
pub use hysteresis::HysteresisController;
pub use ledger::TransitionLedger;

#[cfg(test)]
mod tests {
    use super::*;
    use regent_types::{RegimeScore, RegimeState, SignalSnapshot};

    #[test]
    fn quiescent_platform_stays_normal() {
        let snapshot = SignalSnapshot::quiescent();
        let score = RegimeScore::from_snapshot(&snapshot).unwrap();
        assert_eq!(classifier::classify(score), RegimeState::Normal);
    }

    #[test]
    fn default_configuration_builds_a_governor() {
        let governor = Governor::new(GovernorConfig::default()).unwrap();
        assert_eq!(governor.state(), GovernorState::Running);
        assert_eq!(governor.effective_regime(), RegimeState::Normal);
        assert!(governor.amplitude_profile().is_within_envelope());
    }
}
