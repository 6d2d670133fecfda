//! Health auditing and the append-only event log.

pub mod health;
pub mod logger;

pub use health::{HealthAuditor, Issue, IssueType, OverallHealth, SeoHealth, Severity};
pub use logger::{Event, EventLog};
