//! Error types for the governor runtime.
//!
//! Configuration and ledger-ordering violations are fatal; everything else
//! the governor encounters is an expected outcome carried in the decision
//! contract, not an error.

use chrono::{DateTime, Utc};
use regent_types::{RegimeState, SignalError};
use thiserror::Error;

/// Configuration errors. Fatal at startup; never degraded silently.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A per-regime table is missing an entry for a regime.
    #[error("configuration missing entry for regime {0}")]
    MissingRegime(RegimeState),

    /// A numeric bound pair is non-finite or inverted.
    #[error("malformed bounds for {regime} {field}: {detail}")]
    MalformedBounds {
        regime: RegimeState,
        field: &'static str,
        detail: String,
    },

    /// A per-regime range escapes the global safety envelope.
    #[error("{regime} {field} escapes the safety envelope: {detail}")]
    EnvelopeViolation {
        regime: RegimeState,
        field: &'static str,
        detail: String,
    },

    /// An unstable regime's produced amplitudes would accelerate learning
    /// or dull detection.
    #[error("unstable regime {regime} violates amplitude invariant: {detail}")]
    UnstableRegimeInvariant {
        regime: RegimeState,
        detail: String,
    },

    /// A hysteresis or governor scalar is out of its legal range.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),

    /// Configuration document failed to parse.
    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ledger ordering violations. A breach is a fatal invariant failure:
/// evaluation halts rather than silently reordering or dropping records.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A record's sequence number does not extend the tail.
    #[error("non-monotonic ledger sequence: expected {expected}, got {got}")]
    NonMonotonicSequence { expected: u64, got: u64 },

    /// A record's timestamp does not strictly advance past the tail.
    #[error("non-monotonic ledger timestamp at sequence {sequence_no}: {at} <= {last_at}")]
    NonMonotonicTimestamp {
        sequence_no: u64,
        at: DateTime<Utc>,
        last_at: DateTime<Utc>,
    },

    /// A replayed record uses an edge outside the transition topology.
    #[error("replayed sequence {sequence_no} uses illegal edge {from} -> {to}")]
    IllegalReplayEdge {
        sequence_no: u64,
        from: RegimeState,
        to: RegimeState,
    },

    /// A replayed record does not depart from the previous record's
    /// destination regime.
    #[error("replayed sequence {sequence_no} departs {found}, expected {expected}")]
    BrokenReplayChain {
        sequence_no: u64,
        expected: RegimeState,
        found: RegimeState,
    },
}

/// Errors surfaced by the governor itself.
#[derive(Debug, Error)]
pub enum GovernorError {
    /// Fatal startup configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A producer delivered an out-of-range signal (contract violation).
    #[error(transparent)]
    Signal(#[from] SignalError),

    /// Fatal ledger ordering breach; evaluation has halted.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The transition topology lost its recovery-path guarantee.
    #[error("no directed path from {0} back to normal")]
    RecoveryPathBroken(RegimeState),

    /// The governor is stopped; no further ticks are served.
    #[error("governor is stopped")]
    Stopped,
}

/// Result type for governor operations.
pub type GovernorResult<T> = Result<T, GovernorError>;
