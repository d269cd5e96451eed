//! Append-only transition ledger with a hard ordering guard.
//!
//! The ledger is the source of truth for dwell measurement and recent
//! transition churn. It grows monotonically and is never truncated at
//! runtime; retention is an external concern.

use regent_types::TransitionRecord;

use crate::clock::GovernorClock;
use crate::error::LedgerError;
use crate::topology;

/// A record paired with its monotonic stamp.
///
/// The stamp is relative to the owning clock's epoch; replayed records
/// map to negative offsets.
#[derive(Debug, Clone)]
struct LedgerEntry {
    record: TransitionRecord,
    mono_s: f64,
}

/// Append-only, strictly time-ordered sequence of accepted transitions.
#[derive(Debug, Default)]
pub struct TransitionLedger {
    entries: Vec<LedgerEntry>,
}

impl TransitionLedger {
    /// Empty ledger for a fresh governor.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Rebuild from a persisted sequence.
    ///
    /// The replayed records are re-validated before any new tick is
    /// accepted: sequence numbers strictly increase, timestamps strictly
    /// increase, every edge is in the transition topology, and each
    /// record departs from the previous record's destination.
    pub fn restore(
        records: Vec<TransitionRecord>,
        clock: &GovernorClock,
    ) -> Result<Self, LedgerError> {
        let mut previous: Option<&TransitionRecord> = None;
        for record in &records {
            if !topology::is_legal(record.from_regime, record.to_regime) {
                return Err(LedgerError::IllegalReplayEdge {
                    sequence_no: record.sequence_no,
                    from: record.from_regime,
                    to: record.to_regime,
                });
            }
            if let Some(prev) = previous {
                if record.sequence_no <= prev.sequence_no {
                    return Err(LedgerError::NonMonotonicSequence {
                        expected: prev.sequence_no + 1,
                        got: record.sequence_no,
                    });
                }
                if record.at <= prev.at {
                    return Err(LedgerError::NonMonotonicTimestamp {
                        sequence_no: record.sequence_no,
                        at: record.at,
                        last_at: prev.at,
                    });
                }
                if record.from_regime != prev.to_regime {
                    return Err(LedgerError::BrokenReplayChain {
                        sequence_no: record.sequence_no,
                        expected: prev.to_regime,
                        found: record.from_regime,
                    });
                }
            }
            previous = Some(record);
        }

        let entries = records
            .into_iter()
            .map(|record| {
                let mono_s = clock.mono_of_wall(record.at);
                LedgerEntry { record, mono_s }
            })
            .collect();
        Ok(Self { entries })
    }

    /// Append an accepted transition.
    ///
    /// Fails when the record does not strictly extend the tail in both
    /// sequence and time. A failure here is a fatal invariant breach for
    /// the owning controller.
    pub fn append(&mut self, record: TransitionRecord, mono_s: f64) -> Result<(), LedgerError> {
        if let Some(last) = self.entries.last() {
            let expected = last.record.sequence_no + 1;
            if record.sequence_no != expected {
                return Err(LedgerError::NonMonotonicSequence {
                    expected,
                    got: record.sequence_no,
                });
            }
            if record.at <= last.record.at || mono_s <= last.mono_s {
                return Err(LedgerError::NonMonotonicTimestamp {
                    sequence_no: record.sequence_no,
                    at: record.at,
                    last_at: last.record.at,
                });
            }
        }
        self.entries.push(LedgerEntry { record, mono_s });
        Ok(())
    }

    /// Most recent accepted transition, if any. O(1).
    pub fn latest(&self) -> Option<&TransitionRecord> {
        self.entries.last().map(|entry| &entry.record)
    }

    /// Sequence number the next record must carry.
    pub fn next_sequence_no(&self) -> u64 {
        self.entries
            .last()
            .map(|entry| entry.record.sequence_no + 1)
            .unwrap_or(1)
    }

    /// Number of accepted transitions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any transition has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accepted transitions stamped at or after the cutoff, scanning
    /// backward from the tail so cost is bounded by the window size.
    pub fn count_since(&self, cutoff_mono_s: f64) -> u32 {
        self.entries
            .iter()
            .rev()
            .take_while(|entry| entry.mono_s >= cutoff_mono_s)
            .count() as u32
    }

    /// The last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<TransitionRecord> {
        let start = self.entries.len().saturating_sub(n);
        self.entries[start..]
            .iter()
            .map(|entry| entry.record.clone())
            .collect()
    }

    /// Iterate over all records, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use regent_types::RegimeState;

    fn record(
        sequence_no: u64,
        from: RegimeState,
        to: RegimeState,
        at: DateTime<Utc>,
    ) -> TransitionRecord {
        TransitionRecord {
            sequence_no,
            from_regime: from,
            to_regime: to,
            at,
            duration_in_from_s: 10.0,
            reason: "test".to_string(),
        }
    }

    #[test]
    fn append_extends_the_tail() {
        let mut ledger = TransitionLedger::new();
        let base = Utc::now();

        ledger
            .append(
                record(1, RegimeState::Normal, RegimeState::Heightened, base),
                1.0,
            )
            .unwrap();
        ledger
            .append(
                record(
                    2,
                    RegimeState::Heightened,
                    RegimeState::Normal,
                    base + ChronoDuration::seconds(5),
                ),
                6.0,
            )
            .unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.latest().unwrap().sequence_no, 2);
        assert_eq!(ledger.next_sequence_no(), 3);
    }

    #[test]
    fn stale_timestamp_is_a_hard_failure() {
        let mut ledger = TransitionLedger::new();
        let base = Utc::now();

        ledger
            .append(
                record(1, RegimeState::Normal, RegimeState::Heightened, base),
                5.0,
            )
            .unwrap();

        let result = ledger.append(
            record(
                2,
                RegimeState::Heightened,
                RegimeState::Normal,
                base - ChronoDuration::seconds(1),
            ),
            6.0,
        );
        assert!(matches!(
            result,
            Err(LedgerError::NonMonotonicTimestamp { .. })
        ));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn sequence_gap_is_a_hard_failure() {
        let mut ledger = TransitionLedger::new();
        let base = Utc::now();

        ledger
            .append(
                record(1, RegimeState::Normal, RegimeState::Heightened, base),
                1.0,
            )
            .unwrap();

        let result = ledger.append(
            record(
                4,
                RegimeState::Heightened,
                RegimeState::Normal,
                base + ChronoDuration::seconds(2),
            ),
            3.0,
        );
        assert!(matches!(
            result,
            Err(LedgerError::NonMonotonicSequence {
                expected: 2,
                got: 4
            })
        ));
    }

    #[test]
    fn count_since_only_sees_the_tail_window() {
        let mut ledger = TransitionLedger::new();
        let base = Utc::now();

        let steps = [
            (RegimeState::Normal, RegimeState::Heightened),
            (RegimeState::Heightened, RegimeState::Normal),
            (RegimeState::Normal, RegimeState::Heightened),
            (RegimeState::Heightened, RegimeState::Normal),
        ];
        for (i, (from, to)) in steps.iter().enumerate() {
            let offset = (i as f64) * 10.0;
            ledger
                .append(
                    record(
                        (i + 1) as u64,
                        *from,
                        *to,
                        base + ChronoDuration::seconds(10 * i as i64),
                    ),
                    offset,
                )
                .unwrap();
        }

        assert_eq!(ledger.count_since(0.0), 4);
        assert_eq!(ledger.count_since(15.0), 2);
        assert_eq!(ledger.count_since(31.0), 0);
    }

    #[test]
    fn recent_returns_the_tail_oldest_first() {
        let mut ledger = TransitionLedger::new();
        let base = Utc::now();

        ledger
            .append(
                record(1, RegimeState::Normal, RegimeState::Heightened, base),
                1.0,
            )
            .unwrap();
        ledger
            .append(
                record(
                    2,
                    RegimeState::Heightened,
                    RegimeState::ControlledDegradation,
                    base + ChronoDuration::seconds(5),
                ),
                6.0,
            )
            .unwrap();

        let tail = ledger.recent(1);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].sequence_no, 2);
        assert_eq!(ledger.recent(10).len(), 2);
    }

    #[test]
    fn restore_revalidates_the_sequence() {
        let clock = GovernorClock::start();
        let base = clock.epoch_wall() - ChronoDuration::seconds(100);

        let good = vec![
            record(1, RegimeState::Normal, RegimeState::Heightened, base),
            record(
                2,
                RegimeState::Heightened,
                RegimeState::ControlledDegradation,
                base + ChronoDuration::seconds(40),
            ),
        ];
        let ledger = TransitionLedger::restore(good, &clock).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.next_sequence_no(), 3);

        let illegal_edge = vec![record(
            1,
            RegimeState::Normal,
            RegimeState::EmergencyStabilization,
            base,
        )];
        assert!(matches!(
            TransitionLedger::restore(illegal_edge, &clock),
            Err(LedgerError::IllegalReplayEdge { .. })
        ));

        let broken_chain = vec![
            record(1, RegimeState::Normal, RegimeState::Heightened, base),
            record(
                2,
                RegimeState::ControlledDegradation,
                RegimeState::Heightened,
                base + ChronoDuration::seconds(40),
            ),
        ];
        assert!(matches!(
            TransitionLedger::restore(broken_chain, &clock),
            Err(LedgerError::BrokenReplayChain { .. })
        ));
    }
}
