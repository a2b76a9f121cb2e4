//! Compatibility scoring and connection-state resolution.
//!
//! Everything here is pure: callers fetch profiles and connection records
//! and pass them in; nothing is read from ambient session state.

pub mod compatibility;
pub mod overlay;
pub mod ranking;
pub mod resolver;

pub use compatibility::{
    compatibility, compute_score, derive_pattern_relations, score_pair, Compatibility, PatternRelations,
};
pub use overlay::{PendingOverlay, Reconciliation};
pub use ranking::{rank_candidates, MatchCandidate};
pub use resolver::{can_send_request, resolve, resolve_with_report, state_for, ResolveReport, StateMap};
