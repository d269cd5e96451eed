//! Core type definitions for the Regent operational regime governor.
//!
//! Everything here is a plain, serializable value type shared between the
//! governor runtime and its collaborators:
//!
//! - [`RegimeState`]: the five-regime classification with its severity scale
//! - [`SignalSnapshot`] / [`RegimeScore`]: the fixed five-signal input
//!   schema and the weighted composite score derived from it
//! - [`TransitionRecord`] / [`RegimeDecision`]: the ledger entry and
//!   per-tick decision contracts
//! - [`AmplitudeProfile`]: the bounded multiplier set published per regime
//!
//! Types are immutable in spirit: the runtime replaces values, it never
//! mutates shared ones.

pub mod amplitude;
pub mod ids;
pub mod record;
pub mod regime;
pub mod signal;

pub use amplitude::{
    AmplitudeProfile, Bounds, EMOTION_MULTIPLIER_ENVELOPE, ETA_SCALE_ENVELOPE,
    SENSITIVITY_MULTIPLIER_ENVELOPE,
};
pub use ids::GovernorId;
pub use record::{DecisionReason, RegimeDecision, TransitionRecord};
pub use regime::{is_strict_downgrade, RegimeState};
pub use signal::{RegimeScore, SignalError, SignalKind, SignalSnapshot};
