//! Token estimation and history compaction rules.
//!
//! Provides the approximate token estimator used for every message and the
//! policy that decides when, and how, a session's history is compacted.

pub mod compactor;
pub mod estimator;

pub use compactor::{
    CompactionOutcome, CompactionPolicy, CompactionResult, ContextCompactor, SummaryInstruction,
};
pub use estimator::{estimate, estimate_messages};
