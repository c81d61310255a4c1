//! Name matching between the candidates of a source and a target type.
//!
//! Candidates (fields, accessors, enumeration members, union variants) are
//! collected per side, renamed into match keys, and paired by [`Matcher`].
//! When the pairing is incomplete or ambiguous the verdicts are rendered as a
//! [`Table`] for the diagnostic.

mod index;
mod matcher;
mod relation;
mod visualize;

pub use index::{Candidate, CandidateIndex, CandidateSet, Entry};
pub use matcher::{Match, Matcher};
pub use relation::Relation;
pub use visualize::{Column, FailureKind, MatchFailure, Reason, Table, MATCHED, MISSING, SKIPPED};
