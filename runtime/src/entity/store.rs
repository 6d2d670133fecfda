//! Read-only access to the entity store.
//!
//! The pipeline never writes entities. Implementations are expected to return
//! a consistent snapshot per call; the in-memory store serves tests and the CLI.

use crate::entity::types::{Blog, Clinic, Doctor, Entity, EntityType, Indexable, Job, Treatment};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::RwLock;

/// Restricts `find_many` results by publication and slug state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFilter {
    /// Only approved (or published) entities.
    pub live_only: bool,
    /// Only entities whose slug is present and locked.
    pub stable_slug_only: bool,
    /// Only active job postings. Ignored for other types.
    pub active_only: bool,
}

impl StatusFilter {
    /// Every entity of the type.
    pub fn any() -> Self {
        Self::default()
    }

    /// Approved or published entities, the corpus for duplicate detection.
    pub fn live() -> Self {
        Self {
            live_only: true,
            ..Self::default()
        }
    }

    /// Candidates for a sitemap: live, slug locked, and active for jobs.
    pub fn sitemap(kind: EntityType) -> Self {
        Self {
            live_only: true,
            stable_slug_only: true,
            active_only: kind == EntityType::Job,
        }
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        if self.live_only && !entity.is_live() {
            return false;
        }
        if self.stable_slug_only && !entity.has_stable_slug() {
            return false;
        }
        if self.active_only {
            if let Entity::Job(job) = entity {
                return job.is_active;
            }
        }
        true
    }
}

/// Source of entities for every pipeline stage.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find_by_id(&self, kind: EntityType, id: &str) -> Result<Option<Entity>>;

    async fn find_many(&self, kind: EntityType, filter: &StatusFilter) -> Result<Vec<Entity>>;
}

/// Store file layout: one array per entity type.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreFile {
    clinics: Vec<Clinic>,
    doctors: Vec<Doctor>,
    jobs: Vec<Job>,
    blogs: Vec<Blog>,
    treatments: Vec<Treatment>,
}

/// In-memory entity store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: RwLock<Vec<Entity>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entities(entities: Vec<Entity>) -> Self {
        Self {
            entities: RwLock::new(entities),
        }
    }

    /// Parse a JSON document of the form `{"clinics": [...], "jobs": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: StoreFile = serde_json::from_str(json)?;
        let entities = file
            .clinics
            .into_iter()
            .map(Entity::Clinic)
            .chain(file.doctors.into_iter().map(Entity::Doctor))
            .chain(file.jobs.into_iter().map(Entity::Job))
            .chain(file.blogs.into_iter().map(Entity::Blog))
            .chain(file.treatments.into_iter().map(Entity::Treatment))
            .collect();
        Ok(Self::with_entities(entities))
    }

    /// Load a store file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Add or replace an entity (matched by type and id).
    pub fn insert(&self, entity: Entity) {
        let mut entities = self.entities.write().unwrap_or_else(|e| e.into_inner());
        entities.retain(|e| !(e.kind() == entity.kind() && e.id() == entity.id()));
        entities.push(entity);
    }

    pub fn len(&self) -> usize {
        self.entities.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn find_by_id(&self, kind: EntityType, id: &str) -> Result<Option<Entity>> {
        let entities = self.entities.read().unwrap_or_else(|e| e.into_inner());
        Ok(entities
            .iter()
            .find(|e| e.kind() == kind && e.id() == id)
            .cloned())
    }

    async fn find_many(&self, kind: EntityType, filter: &StatusFilter) -> Result<Vec<Entity>> {
        let entities = self.entities.read().unwrap_or_else(|e| e.into_inner());
        Ok(entities
            .iter()
            .filter(|e| e.kind() == kind && filter.matches(e))
            .cloned()
            .collect())
    }
}
