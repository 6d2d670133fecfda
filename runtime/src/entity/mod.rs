//! Content entities and the store they are read from.

pub mod store;
pub mod types;

pub use store::{EntityStore, MemoryStore, StatusFilter};
pub use types::{
    ApprovalStatus, Blog, Clinic, Doctor, Entity, EntityType, Indexable, Job, Pricing,
    PublishStatus, Timing, Treatment, TreatmentRef,
};
