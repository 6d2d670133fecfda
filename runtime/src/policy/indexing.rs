//! Indexing policy: should an entity be exposed to search engines?
//!
//! Guards are evaluated in order and the first match wins:
//!
//! 1. entity not found
//! 2. not approved (or not published, for blogs)
//! 3. slug missing or not locked
//! 4. content checks: completeness, duplication, thinness
//!
//! Blogs take a shorter path with no completeness or duplicate checks.
//! Store failures and scan timeouts never escape `decide`; they become a
//! non-indexable decision whose reason starts with `Error:`.

use crate::entity::types::{present, text_len, Blog, Clinic, Doctor, Job, Treatment};
use crate::entity::{Entity, EntityStore, EntityType, Indexable, StatusFilter};
use crate::error::Result;
use crate::policy::duplicate::{DuplicateCheck, DuplicateDetector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

const BLOG_MIN_CONTENT: usize = 100;
const BLOG_MIN_TITLE: usize = 10;

pub const REASON_SLUG: &str = "Slug not generated or locked";
pub const REASON_DUPLICATE_THIN: &str = "Duplicate and thin content";
pub const REASON_BLOG_THIN: &str = "Blog content too thin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// Category of a policy finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Incomplete,
    Duplicate,
    ThinContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl PolicyWarning {
    fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The verdict driving every downstream SEO artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingDecision {
    pub should_index: bool,
    pub reason: String,
    pub priority: Priority,
    pub warnings: Vec<PolicyWarning>,
}

impl IndexingDecision {
    fn deny(reason: impl Into<String>) -> Self {
        Self {
            should_index: false,
            reason: reason.into(),
            priority: Priority::Low,
            warnings: Vec::new(),
        }
    }

    fn allow(reason: impl Into<String>, priority: Priority) -> Self {
        Self {
            should_index: true,
            reason: reason.into(),
            priority,
            warnings: Vec::new(),
        }
    }

    /// Fallback for an internal failure.
    pub fn from_error(message: impl std::fmt::Display) -> Self {
        Self::deny(format!("Error: {message}"))
    }

    pub fn has_warning(&self, kind: WarningKind) -> bool {
        self.warnings.iter().any(|w| w.kind == kind)
    }
}

/// Type-specific completeness and thinness predicates.
pub trait ContentRules: Sync {
    /// Required fields or sub-resources that are absent.
    fn missing_fields(&self) -> Vec<&'static str>;

    /// Why the content is too thin to stand on its own, if it is.
    fn thin_content(&self) -> Option<String>;

    /// Reason used when required fields are missing.
    fn incomplete_reason(&self) -> &'static str {
        "Incomplete profile"
    }

    /// Reason used when the entity passes every check.
    fn indexable_reason(&self) -> &'static str;

    /// Priority of a clean pass.
    fn base_priority(&self) -> Priority {
        Priority::High
    }
}

impl ContentRules for Clinic {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if !present(&self.address) {
            missing.push("address");
        }
        if !present(&self.city) {
            missing.push("city");
        }
        if !present(&self.phone) {
            missing.push("phone");
        }
        if self.pricing.is_none() {
            missing.push("pricing");
        }
        if self.timings.is_empty() {
            missing.push("timings");
        }
        if self.treatments.is_empty() {
            missing.push("treatments");
        }
        missing
    }

    fn thin_content(&self) -> Option<String> {
        let len = text_len(&self.about);
        (len < 100).then(|| format!("Clinic description is only {len} characters"))
    }

    fn indexable_reason(&self) -> &'static str {
        "Clinic profile complete and unique"
    }
}

impl ContentRules for Doctor {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if !present(&self.degree) {
            missing.push("degree");
        }
        if !present(&self.specialization) {
            missing.push("specialization");
        }
        if !present(&self.city) {
            missing.push("city");
        }
        if self.experience_years.is_none() {
            missing.push("experience");
        }
        if self.treatments.is_empty() {
            missing.push("treatments");
        }
        missing
    }

    fn thin_content(&self) -> Option<String> {
        let len = text_len(&self.bio);
        (len < 100).then(|| format!("Doctor bio is only {len} characters"))
    }

    fn indexable_reason(&self) -> &'static str {
        "Doctor profile complete and unique"
    }
}

impl ContentRules for Job {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if !present(&self.company) {
            missing.push("company");
        }
        if !present(&self.city) {
            missing.push("city");
        }
        if !present(&self.description) {
            missing.push("description");
        }
        if !present(&self.employment_type) {
            missing.push("employment type");
        }
        missing
    }

    fn thin_content(&self) -> Option<String> {
        let len = text_len(&self.description);
        (len < 200).then(|| format!("Job description is only {len} characters"))
    }

    fn incomplete_reason(&self) -> &'static str {
        "Incomplete job posting"
    }

    fn indexable_reason(&self) -> &'static str {
        "Job posting complete and unique"
    }
}

impl ContentRules for Treatment {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if !present(&self.description) {
            missing.push("description");
        }
        missing
    }

    fn thin_content(&self) -> Option<String> {
        let len = text_len(&self.description);
        (len < 50).then(|| format!("Treatment description is only {len} characters"))
    }

    fn incomplete_reason(&self) -> &'static str {
        "Incomplete treatment page"
    }

    fn indexable_reason(&self) -> &'static str {
        "Treatment page complete and unique"
    }

    fn base_priority(&self) -> Priority {
        Priority::Medium
    }
}

fn not_found(kind: EntityType) -> IndexingDecision {
    IndexingDecision::deny(format!("{} not found", kind.label()))
}

/// Outcome of the cheap guards: either a final decision, or the rules to run
/// the duplicate and thinness checks with.
enum Route<'a> {
    Decided(IndexingDecision),
    Content(&'a dyn ContentRules),
}

fn route(entity: &Entity) -> Route<'_> {
    let kind = entity.kind();
    if !entity.is_live() {
        let verb = if kind == EntityType::Blog { "published" } else { "approved" };
        return Route::Decided(IndexingDecision::deny(format!("{} not {verb}", kind.label())));
    }
    if !entity.has_stable_slug() {
        return Route::Decided(IndexingDecision::deny(REASON_SLUG));
    }

    let rules: &dyn ContentRules = match entity {
        Entity::Blog(blog) => return Route::Decided(decide_blog(blog)),
        Entity::Clinic(c) => c,
        Entity::Doctor(d) => d,
        Entity::Job(j) => j,
        Entity::Treatment(t) => t,
    };
    let missing = rules.missing_fields();
    if !missing.is_empty() {
        return Route::Decided(incomplete(rules, &missing));
    }
    Route::Content(rules)
}

fn decide_blog(blog: &Blog) -> IndexingDecision {
    let content_len = blog.content.trim().chars().count();
    let title_len = blog.title.trim().chars().count();
    if content_len > BLOG_MIN_CONTENT && title_len > BLOG_MIN_TITLE {
        IndexingDecision::allow("Blog post published and substantial", Priority::High)
    } else {
        let mut decision = IndexingDecision::deny(REASON_BLOG_THIN);
        decision.warnings.push(PolicyWarning::new(
            WarningKind::ThinContent,
            format!("Blog has {content_len} content characters and a {title_len}-character title"),
        ));
        decision
    }
}

/// Content checks once the entity has passed every gate.
fn decide_content(rules: &dyn ContentRules, duplicate: &DuplicateCheck) -> IndexingDecision {
    let thin = rules.thin_content();

    if duplicate.is_duplicate && thin.is_some() {
        let mut decision = IndexingDecision::deny(REASON_DUPLICATE_THIN);
        decision
            .warnings
            .push(PolicyWarning::new(WarningKind::Duplicate, duplicate.reason.clone()));
        if let Some(msg) = thin {
            decision
                .warnings
                .push(PolicyWarning::new(WarningKind::ThinContent, msg));
        }
        return decision;
    }

    let mut decision = IndexingDecision::allow(rules.indexable_reason(), rules.base_priority());
    if duplicate.is_duplicate {
        decision.priority = Priority::Low;
        decision.warnings.push(PolicyWarning::new(
            WarningKind::Duplicate,
            format!("Possible duplicate: {}", duplicate.reason),
        ));
    }
    if let Some(msg) = thin {
        decision.priority = Priority::Low;
        decision
            .warnings
            .push(PolicyWarning::new(WarningKind::ThinContent, msg));
    }
    decision
}

fn incomplete(rules: &dyn ContentRules, missing: &[&str]) -> IndexingDecision {
    let mut decision = IndexingDecision::deny(rules.incomplete_reason());
    decision.warnings.push(PolicyWarning::new(
        WarningKind::Incomplete,
        format!("Missing required fields: {}", missing.join(", ")),
    ));
    decision
}

/// Decides whether entities should be indexed.
#[derive(Clone)]
pub struct IndexingPolicy {
    store: Arc<dyn EntityStore>,
    detector: DuplicateDetector,
}

impl IndexingPolicy {
    pub fn new(store: Arc<dyn EntityStore>, detector: DuplicateDetector) -> Self {
        Self { store, detector }
    }

    pub fn detector(&self) -> &DuplicateDetector {
        &self.detector
    }

    /// Decide for the entity with the given id. Never fails.
    pub async fn decide(&self, kind: EntityType, id: &str) -> IndexingDecision {
        let decision = match self.try_decide(kind, id).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(entity_type = %kind, entity_id = id, error = %e, "indexing decision failed");
                IndexingDecision::from_error(e)
            }
        };
        info!(
            entity_type = %kind,
            entity_id = id,
            should_index = decision.should_index,
            priority = ?decision.priority,
            reason = %decision.reason,
            "indexing decision"
        );
        decision
    }

    async fn try_decide(&self, kind: EntityType, id: &str) -> Result<IndexingDecision> {
        let Some(entity) = self.store.find_by_id(kind, id).await? else {
            return Ok(not_found(kind));
        };
        self.try_decide_entity(entity).await
    }

    /// Decide for an entity already in hand, fetching only the peer corpus.
    pub async fn decide_entity(&self, entity: &Entity) -> IndexingDecision {
        match self.try_decide_entity(entity.clone()).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(entity_type = %entity.kind(), entity_id = entity.id(), error = %e, "indexing decision failed");
                IndexingDecision::from_error(e)
            }
        }
    }

    /// Like `decide_entity`, but surfaces store and scan failures.
    pub(crate) async fn try_decide_entity(&self, entity: Entity) -> Result<IndexingDecision> {
        if let Route::Decided(decision) = route(&entity) {
            return Ok(decision);
        }

        let corpus = self
            .store
            .find_many(entity.kind(), &StatusFilter::live())
            .await?;
        debug!(entity_type = %entity.kind(), corpus = corpus.len(), "scanning for duplicates");
        self.evaluate(&entity, corpus.into()).await
    }

    /// Decide against a corpus fetched once by the caller, as sitemap builds
    /// do. The duplicate scan runs off the async workers and is bounded by the
    /// detector's scan timeout, exactly as in `decide`.
    pub async fn evaluate(&self, entity: &Entity, corpus: Arc<[Entity]>) -> Result<IndexingDecision> {
        match route(entity) {
            Route::Decided(decision) => Ok(decision),
            Route::Content(rules) => {
                let duplicate = self.detector.check_bounded(entity.clone(), corpus).await?;
                Ok(decide_content(rules, &duplicate))
            }
        }
    }
}
