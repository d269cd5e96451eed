//! Governor orchestration: the evaluation loop, snapshot ingestion,
//! decision publication, and the read-only query surface.
//!
//! Evaluation is strictly serialized: `tick` takes `&mut self`, so no
//! two ticks ever run concurrently. Producers push snapshots through a
//! cloneable [`SnapshotIngress`] handle concurrently with evaluation;
//! only the most recent snapshot is retained.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use regent_types::{
    AmplitudeProfile, DecisionReason, GovernorId, RegimeDecision, RegimeScore, RegimeState,
    SignalSnapshot, TransitionRecord,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::amplitude::AmplitudeScaler;
use crate::classifier;
use crate::clock::GovernorClock;
use crate::config::GovernorConfig;
use crate::error::{GovernorError, GovernorResult};
use crate::hysteresis::HysteresisController;
use crate::topology;

/// Lifecycle state of the evaluation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernorState {
    /// Evaluating ticks against fresh input.
    Running,

    /// No fresh snapshot within the staleness bound; the last effective
    /// regime is retained and no new decisions are produced.
    DegradedStaleInput,

    /// Terminal. Entered by explicit shutdown or a fatal ledger breach.
    Stopped,
}

impl std::fmt::Display for GovernorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GovernorState::Running => "running",
            GovernorState::DegradedStaleInput => "degraded_stale_input",
            GovernorState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Events published to consumers.
///
/// Publication is fire-and-forget broadcast: a lagging consumer drops
/// the oldest events, the governor never stalls on a slow one.
#[derive(Debug, Clone)]
pub enum GovernorEvent {
    /// Published after every evaluated tick.
    Decision {
        governor_id: GovernorId,
        effective_regime: RegimeState,
        regime_ordinal: u8,
        amplitude_profile: AmplitudeProfile,
        decision: RegimeDecision,
        ledger_sequence_no: Option<u64>,
    },

    /// An accepted transition, with its ledger record.
    RegimeShift {
        governor_id: GovernorId,
        record: TransitionRecord,
    },

    /// Lifecycle state change.
    StateChanged {
        governor_id: GovernorId,
        from: GovernorState,
        to: GovernorState,
    },
}

/// Single-slot holder for the freshest snapshot.
#[derive(Debug, Default)]
struct SnapshotSlot {
    latest: Option<(SignalSnapshot, f64)>,
}

/// Cloneable producer handle for delivering snapshots.
///
/// Only the most recent snapshot is retained; older pending snapshots
/// are discarded, never queued.
#[derive(Clone)]
pub struct SnapshotIngress {
    slot: Arc<RwLock<SnapshotSlot>>,
    clock: GovernorClock,
}

impl SnapshotIngress {
    /// Replace the pending snapshot with a newer reading.
    pub fn offer(&self, snapshot: SignalSnapshot) {
        let stamp = self.clock.now();
        let mut slot = self.slot.write().unwrap();
        slot.latest = Some((snapshot, stamp.mono_s));
        debug!(taken_at = %snapshot.taken_at, "snapshot offered");
    }
}

/// Read-only status surface for telemetry and debug consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorStatus {
    /// Governor instance identity.
    pub id: GovernorId,

    /// Lifecycle state.
    pub state: GovernorState,

    /// Current effective regime.
    pub effective_regime: RegimeState,

    /// Published ordinal of the effective regime.
    pub regime_ordinal: u8,

    /// Dwell in the current regime, seconds.
    pub dwell_s: f64,

    /// Accepted transitions so far.
    pub ledger_len: usize,

    /// Age of the freshest snapshot, if one has ever arrived.
    pub snapshot_age_s: Option<f64>,
}

/// The operational regime governor.
///
/// Owns the current regime, the hysteresis controller (and through it
/// the transition ledger) and the validated amplitude table. Consumers
/// only ever see immutable snapshot copies of its state.
pub struct Governor {
    id: GovernorId,
    config: GovernorConfig,
    clock: GovernorClock,
    state: GovernorState,
    controller: HysteresisController,
    scaler: AmplitudeScaler,
    slot: Arc<RwLock<SnapshotSlot>>,
    event_tx: broadcast::Sender<GovernorEvent>,
}

impl Governor {
    /// Build a governor in `Normal`, validating the configuration
    /// wholesale and verifying the recovery-path guarantee. Fatal on
    /// any violation.
    pub fn new(config: GovernorConfig) -> GovernorResult<Self> {
        config.validate()?;
        topology::verify_recovery_path()?;

        let clock = GovernorClock::start();
        let scaler = AmplitudeScaler::from_config(&config.amplitude)?;
        let controller =
            HysteresisController::new(config.hysteresis.clone(), RegimeState::Normal, clock.now());
        Self::assemble(config, clock, controller, scaler)
    }

    /// Build a governor from a replayed ledger.
    ///
    /// The replayed sequence is re-validated (ordering and topology)
    /// before any tick is served; the current regime and dwell anchor
    /// come from the tail record.
    pub fn with_replayed_ledger(
        config: GovernorConfig,
        records: Vec<TransitionRecord>,
    ) -> GovernorResult<Self> {
        config.validate()?;
        topology::verify_recovery_path()?;

        let clock = GovernorClock::start();
        let scaler = AmplitudeScaler::from_config(&config.amplitude)?;
        let controller =
            HysteresisController::restore(config.hysteresis.clone(), records, &clock)?;
        Self::assemble(config, clock, controller, scaler)
    }

    fn assemble(
        config: GovernorConfig,
        clock: GovernorClock,
        controller: HysteresisController,
        scaler: AmplitudeScaler,
    ) -> GovernorResult<Self> {
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let id = GovernorId::generate();
        info!(
            governor_id = %id,
            regime = %controller.current(),
            "governor initialized"
        );
        Ok(Self {
            id,
            config,
            clock,
            state: GovernorState::Running,
            controller,
            scaler,
            slot: Arc::new(RwLock::new(SnapshotSlot::default())),
            event_tx,
        })
    }

    /// Governor instance identity.
    pub fn id(&self) -> &GovernorId {
        &self.id
    }

    /// Lifecycle state.
    pub fn state(&self) -> GovernorState {
        self.state
    }

    /// Producer handle for snapshot delivery.
    pub fn ingress(&self) -> SnapshotIngress {
        SnapshotIngress {
            slot: Arc::clone(&self.slot),
            clock: self.clock,
        }
    }

    /// Subscribe to published decisions and lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<GovernorEvent> {
        self.event_tx.subscribe()
    }

    /// Current effective regime.
    pub fn effective_regime(&self) -> RegimeState {
        self.controller.current()
    }

    /// Amplitude profile for the current effective regime.
    pub fn amplitude_profile(&self) -> AmplitudeProfile {
        self.scaler.profile_for(self.controller.current())
    }

    /// Amplitude profile for an arbitrary regime, from the validated table.
    pub fn amplitude_profile_for(&self, regime: RegimeState) -> AmplitudeProfile {
        self.scaler.profile_for(regime)
    }

    /// The last `n` ledger records, oldest first.
    pub fn recent_records(&self, n: usize) -> Vec<TransitionRecord> {
        self.controller.ledger().recent(n)
    }

    /// Snapshot of the governor's externally visible state.
    pub fn status(&self) -> GovernorStatus {
        let now = self.clock.now();
        let snapshot_age_s = self
            .slot
            .read()
            .unwrap()
            .latest
            .map(|(_, received)| now.mono_s - received);
        GovernorStatus {
            id: self.id.clone(),
            state: self.state,
            effective_regime: self.controller.current(),
            regime_ordinal: self.controller.current().ordinal(),
            dwell_s: self.controller.dwell_s(now),
            ledger_len: self.controller.ledger().len(),
            snapshot_age_s,
        }
    }

    /// Explicit shutdown. Terminal: no further ticks are served.
    pub fn shutdown(&mut self) {
        info!(governor_id = %self.id, "governor shutting down");
        self.enter_state(GovernorState::Stopped);
    }

    /// Run one evaluation tick.
    ///
    /// Returns the decision for this tick, or `None` when the governor
    /// is degraded on stale input and retains its last effective regime.
    pub fn tick(&mut self) -> GovernorResult<Option<RegimeDecision>> {
        if self.state == GovernorState::Stopped {
            return Err(GovernorError::Stopped);
        }

        let now = self.clock.now();
        let pending = self.slot.read().unwrap().latest;
        let fresh = pending
            .filter(|(_, received)| now.mono_s - received <= self.config.staleness_bound_s);

        let Some((snapshot, received)) = fresh else {
            let age = pending.map(|(_, received)| now.mono_s - received);
            warn!(
                governor_id = %self.id,
                age_s = ?age,
                bound_s = self.config.staleness_bound_s,
                "no fresh snapshot; retaining last effective regime"
            );
            self.enter_state(GovernorState::DegradedStaleInput);
            return Ok(None);
        };

        self.enter_state(GovernorState::Running);

        // A stale-but-within-bound snapshot is still the freshest truth;
        // the governor never fabricates inputs.
        debug!(
            governor_id = %self.id,
            age_s = now.mono_s - received,
            "evaluating snapshot"
        );

        let score = RegimeScore::from_snapshot(&snapshot).map_err(|err| {
            error!(governor_id = %self.id, error = %err, "producer contract violation");
            GovernorError::from(err)
        })?;
        let classified = classifier::classify(score);
        let proposed = self.controller.filter_proposal(classified, score);
        let trigger = format!("score {score} classified {classified}");

        let decision = match self.controller.decide(proposed, now, &trigger) {
            Ok(decision) => decision,
            Err(breach) => {
                error!(
                    governor_id = %self.id,
                    error = %breach,
                    "ledger ordering breach; halting evaluation"
                );
                self.enter_state(GovernorState::Stopped);
                return Err(breach.into());
            }
        };

        if decision.allowed && decision.reason == DecisionReason::RegimeShift {
            if let Some(record) = self.controller.ledger().latest() {
                let _ = self.event_tx.send(GovernorEvent::RegimeShift {
                    governor_id: self.id.clone(),
                    record: record.clone(),
                });
            }
        }

        let effective = decision.effective_regime;
        let _ = self.event_tx.send(GovernorEvent::Decision {
            governor_id: self.id.clone(),
            effective_regime: effective,
            regime_ordinal: effective.ordinal(),
            amplitude_profile: self.scaler.profile_for(effective),
            decision: decision.clone(),
            ledger_sequence_no: self.controller.ledger().latest().map(|r| r.sequence_no),
        });

        Ok(Some(decision))
    }

    /// Drive the evaluation loop at the configured tick rate until the
    /// governor stops.
    ///
    /// Producer contract violations are logged and skipped; fatal
    /// conditions end the loop.
    pub async fn run(&mut self) -> GovernorResult<()> {
        let mut interval =
            tokio::time::interval(Duration::from_secs_f64(self.config.tick_interval_s));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            match self.tick() {
                Ok(_) => {}
                Err(GovernorError::Stopped) => break,
                Err(err @ GovernorError::Signal(_)) => {
                    warn!(governor_id = %self.id, error = %err, "skipping tick");
                }
                Err(err) => return Err(err),
            }
            if self.state == GovernorState::Stopped {
                break;
            }
        }
        Ok(())
    }

    fn enter_state(&mut self, next: GovernorState) {
        if self.state == next || self.state == GovernorState::Stopped {
            return;
        }
        let from = self.state;
        info!(governor_id = %self.id, from = %from, to = %next, "governor state changed");
        self.state = next;
        let _ = self.event_tx.send(GovernorEvent::StateChanged {
            governor_id: self.id.clone(),
            from,
            to: next,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HysteresisConfig;

    fn fast_config() -> GovernorConfig {
        let mut hysteresis = HysteresisConfig::default();
        for regime in RegimeState::ALL {
            hysteresis.min_duration_s.insert(regime, 0.0);
        }
        GovernorConfig {
            staleness_bound_s: 5.0,
            hysteresis,
            ..GovernorConfig::default()
        }
    }

    fn snapshot_scoring(target: f64) -> SignalSnapshot {
        // With all four risk signals at `target` and continuity at
        // 1 - target, the weighted composite equals `target` exactly.
        SignalSnapshot {
            taken_at: chrono::Utc::now(),
            urf_composite_risk: target,
            mse_meta_instability: target,
            predictive_collapse_risk: target,
            consistency_gap: target,
            csi_continuity_index: 1.0 - target,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tick_without_input_degrades_and_retains_regime() {
        let mut governor = Governor::new(fast_config()).unwrap();

        let outcome = governor.tick().unwrap();
        assert!(outcome.is_none());
        assert_eq!(governor.state(), GovernorState::DegradedStaleInput);
        assert_eq!(governor.effective_regime(), RegimeState::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_snapshot_drives_a_decision() {
        let mut governor = Governor::new(fast_config()).unwrap();
        let ingress = governor.ingress();

        ingress.offer(snapshot_scoring(0.05));
        tokio::time::advance(Duration::from_millis(10)).await;

        let decision = governor.tick().unwrap().unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::NoChange);
        assert_eq!(governor.state(), GovernorState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn escalation_publishes_shift_and_decision() {
        let mut governor = Governor::new(fast_config()).unwrap();
        let ingress = governor.ingress();
        let mut events = governor.subscribe();

        ingress.offer(snapshot_scoring(0.40));
        tokio::time::advance(Duration::from_millis(10)).await;

        let decision = governor.tick().unwrap().unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.effective_regime, RegimeState::Heightened);
        assert_eq!(governor.amplitude_profile().eta_scale.max, 0.85);

        let shift = events.try_recv().unwrap();
        assert!(matches!(shift, GovernorEvent::RegimeShift { .. }));
        let published = events.try_recv().unwrap();
        match published {
            GovernorEvent::Decision {
                effective_regime,
                regime_ordinal,
                ledger_sequence_no,
                ..
            } => {
                assert_eq!(effective_regime, RegimeState::Heightened);
                assert_eq!(regime_ordinal, 1);
                assert_eq!(ledger_sequence_no, Some(1));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stale_snapshot_degrades_then_recovers() {
        let mut governor = Governor::new(fast_config()).unwrap();
        let ingress = governor.ingress();

        ingress.offer(snapshot_scoring(0.40));
        tokio::time::advance(Duration::from_millis(10)).await;
        governor.tick().unwrap().unwrap();
        assert_eq!(governor.effective_regime(), RegimeState::Heightened);

        // Let the snapshot age past the bound.
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(governor.tick().unwrap().is_none());
        assert_eq!(governor.state(), GovernorState::DegradedStaleInput);
        assert_eq!(governor.effective_regime(), RegimeState::Heightened);

        // A fresh snapshot brings evaluation back.
        ingress.offer(snapshot_scoring(0.40));
        tokio::time::advance(Duration::from_millis(10)).await;
        assert!(governor.tick().unwrap().is_some());
        assert_eq!(governor.state(), GovernorState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_signal_surfaces_as_contract_violation() {
        let mut governor = Governor::new(fast_config()).unwrap();
        let ingress = governor.ingress();

        let mut bad = snapshot_scoring(0.2);
        bad.consistency_gap = 1.7;
        ingress.offer(bad);
        tokio::time::advance(Duration::from_millis(10)).await;

        assert!(matches!(
            governor.tick(),
            Err(GovernorError::Signal(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn queries_are_idempotent_and_do_not_touch_the_ledger() {
        let mut governor = Governor::new(fast_config()).unwrap();
        let ingress = governor.ingress();

        ingress.offer(snapshot_scoring(0.40));
        tokio::time::advance(Duration::from_millis(10)).await;
        governor.tick().unwrap().unwrap();

        let first = governor.status();
        let second = governor.status();
        assert_eq!(first.effective_regime, second.effective_regime);
        assert_eq!(first.ledger_len, second.ledger_len);
        assert_eq!(governor.recent_records(10).len(), 1);
        assert_eq!(governor.recent_records(10).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_is_terminal() {
        let mut governor = Governor::new(fast_config()).unwrap();
        governor.shutdown();
        assert_eq!(governor.state(), GovernorState::Stopped);
        assert!(matches!(governor.tick(), Err(GovernorError::Stopped)));

        // No transition out of Stopped, even with fresh input.
        governor.ingress().offer(snapshot_scoring(0.1));
        assert!(matches!(governor.tick(), Err(GovernorError::Stopped)));
        assert_eq!(governor.state(), GovernorState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn replayed_ledger_reestablishes_dwell() {
        let clock_anchor = chrono::Utc::now();
        let records = vec![TransitionRecord {
            sequence_no: 1,
            from_regime: RegimeState::Normal,
            to_regime: RegimeState::Heightened,
            at: clock_anchor - chrono::Duration::seconds(120),
            duration_in_from_s: 60.0,
            reason: "replay".to_string(),
        }];

        let governor = Governor::with_replayed_ledger(fast_config(), records).unwrap();
        assert_eq!(governor.effective_regime(), RegimeState::Heightened);
        assert!(governor.status().dwell_s >= 120.0);
        assert_eq!(governor.status().ledger_len, 1);
    }
}
