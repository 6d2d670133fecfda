//! Indexing policy: similarity scoring, duplicate detection, and the
//! should-this-be-indexed decision.

pub mod duplicate;
pub mod indexing;
pub mod similarity;

pub use duplicate::{Confidence, DuplicateCheck, DuplicateDetector, SimilarEntity};
pub use indexing::{IndexingDecision, IndexingPolicy, PolicyWarning, Priority, WarningKind};
pub use similarity::similarity;
