//! Hysteresis controller: dwell enforcement, step-down policy, and the
//! oscillation advisory.
//!
//! The controller is the only writer to the transition ledger. Every
//! decision is an expected outcome; the single error path is a ledger
//! ordering breach, which is fatal to the owning governor.

use regent_types::{DecisionReason, RegimeDecision, RegimeScore, RegimeState, TransitionRecord};
use tracing::{debug, info, warn};

use crate::classifier;
use crate::clock::{GovernorClock, TickStamp};
use crate::config::HysteresisConfig;
use crate::error::LedgerError;
use crate::ledger::TransitionLedger;
use crate::topology;

/// Stateful gate between classified proposals and the effective regime.
pub struct HysteresisController {
    config: HysteresisConfig,
    current: RegimeState,
    entered_at_mono_s: f64,
    ledger: TransitionLedger,
}

impl HysteresisController {
    /// Controller starting in `initial` at `now`, with an empty ledger.
    ///
    /// The configuration is expected to be validated wholesale by the
    /// owning governor before it reaches this point.
    pub fn new(config: HysteresisConfig, initial: RegimeState, now: TickStamp) -> Self {
        Self {
            config,
            current: initial,
            entered_at_mono_s: now.mono_s,
            ledger: TransitionLedger::new(),
        }
    }

    /// Controller rebuilt from a replayed ledger.
    ///
    /// The current regime and dwell anchor are re-established from the
    /// tail record; an empty replay behaves like [`HysteresisController::new`]
    /// in `Normal`.
    pub fn restore(
        config: HysteresisConfig,
        records: Vec<TransitionRecord>,
        clock: &GovernorClock,
    ) -> Result<Self, LedgerError> {
        let ledger = TransitionLedger::restore(records, clock)?;
        let (current, entered_at_mono_s) = match ledger.latest() {
            Some(tail) => (tail.to_regime, clock.mono_of_wall(tail.at)),
            None => (RegimeState::Normal, clock.now().mono_s),
        };
        Ok(Self {
            config,
            current,
            entered_at_mono_s,
            ledger,
        })
    }

    /// The effective regime.
    pub fn current(&self) -> RegimeState {
        self.current
    }

    /// Seconds dwelt in the current regime as of `now`.
    pub fn dwell_s(&self, now: TickStamp) -> f64 {
        now.mono_s - self.entered_at_mono_s
    }

    /// Read access to the ledger. There is no writable accessor.
    pub fn ledger(&self) -> &TransitionLedger {
        &self.ledger
    }

    /// Apply the downgrade-margin deadband to a classified proposal.
    ///
    /// A severity downgrade whose score has not cleared the margin is
    /// collapsed to the current regime before it ever becomes a
    /// proposal, so it surfaces as "no change" rather than a rejection.
    pub fn filter_proposal(&self, proposed: RegimeState, score: RegimeScore) -> RegimeState {
        let filtered = classifier::filter_downgrade(
            self.current,
            proposed,
            score,
            self.config.downgrade_margin,
        );
        if filtered != proposed {
            debug!(
                current = %self.current,
                proposed = %proposed,
                score = %score,
                margin = self.config.downgrade_margin,
                "downgrade held inside the deadband"
            );
        }
        filtered
    }

    /// Decide whether `proposed` becomes the effective regime at `now`.
    ///
    /// On acceptance the ledger is appended and the dwell anchor resets.
    /// `trigger` becomes the record's human-readable reason.
    pub fn decide(
        &mut self,
        proposed: RegimeState,
        now: TickStamp,
        trigger: &str,
    ) -> Result<RegimeDecision, LedgerError> {
        let dwell = self.dwell_s(now);
        let min_duration = self.config.min_duration_for(self.current);
        let cutoff = now.mono_s - self.config.oscillation_window_s;
        let oscillation_count = self.ledger.count_since(cutoff);
        let oscillation_detected = oscillation_count >= self.config.oscillation_threshold;
        if oscillation_detected {
            warn!(
                count = oscillation_count,
                window_s = self.config.oscillation_window_s,
                "regime oscillation detected (advisory)"
            );
        }

        let decision = |allowed, effective, reason, time_remaining_s| RegimeDecision {
            allowed,
            effective_regime: effective,
            reason,
            current_duration_s: dwell,
            min_duration_s: min_duration,
            time_remaining_s,
            oscillation_detected,
            oscillation_count,
        };

        // Step 1: staying put is always allowed and never recorded.
        if proposed == self.current {
            return Ok(decision(true, self.current, DecisionReason::NoChange, 0.0));
        }

        // Step 2: forbidden edges are rejected regardless of timing.
        if !topology::is_legal(self.current, proposed) {
            debug!(
                from = %self.current,
                to = %proposed,
                "transition rejected: forbidden topology"
            );
            return Ok(decision(
                false,
                self.current,
                DecisionReason::ForbiddenTopology,
                0.0,
            ));
        }

        // Step 3: the current regime's minimum dwell must have elapsed.
        if dwell < min_duration {
            return Ok(decision(
                false,
                self.current,
                DecisionReason::MinimumDurationNotMet,
                min_duration - dwell,
            ));
        }

        // Step 4: recovery steps down only through heightened. Explicit
        // policy, even though the topology already omits this edge.
        if self.current == RegimeState::Recovery && proposed == RegimeState::Normal {
            return Ok(decision(
                false,
                self.current,
                DecisionReason::RecoveryStepdownRequired,
                0.0,
            ));
        }

        // Step 5: accept, record, reset the dwell anchor.
        let record = TransitionRecord {
            sequence_no: self.ledger.next_sequence_no(),
            from_regime: self.current,
            to_regime: proposed,
            at: now.wall,
            duration_in_from_s: dwell,
            reason: trigger.to_string(),
        };
        self.ledger.append(record, now.mono_s)?;

        info!(
            from = %self.current,
            to = %proposed,
            dwell_s = dwell,
            sequence_no = self.ledger.next_sequence_no() - 1,
            "regime transition accepted"
        );
        self.current = proposed;
        self.entered_at_mono_s = now.mono_s;

        Ok(decision(true, proposed, DecisionReason::RegimeShift, 0.0))
    }
}
