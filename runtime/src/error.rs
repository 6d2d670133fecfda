//! Typed errors for the SEO pipeline.

use crate::entity::EntityType;
use thiserror::Error;

/// Errors raised inside pipeline components.
///
/// Policy outcomes (not found, not approved, missing slug) are never errors;
/// they are carried by `IndexingDecision::reason`.
#[derive(Debug, Error)]
pub enum SeoError {
    /// The entity store failed to answer a query.
    #[error("entity store error: {0}")]
    Store(String),

    /// An entity required by a stage was not present in the store.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityType, id: String },

    /// Writing sitemap XML failed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Filesystem failure while writing a sitemap or event log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A bounded operation ran past its deadline.
    #[error("{what} timed out after {ms}ms")]
    Timeout { what: String, ms: u64 },

    /// A spawned blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),

    /// Canonical URL could not be derived.
    #[error("canonical error: {0}")]
    Canonical(String),

    /// Composed meta tags failed validation.
    #[error("meta error: {0}")]
    Meta(String),

    /// Heading plan failed validation.
    #[error("heading error: {0}")]
    Headings(String),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// Entity fixture or payload could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, SeoError>;
