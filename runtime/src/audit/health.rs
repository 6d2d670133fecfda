//! SEO health audit: run every pipeline check against one entity and fold
//! the findings into a 0-100 score.
//!
//! Each issue costs points by severity (critical 20, warning 10, info 5).
//! Any critical issue makes the entity critical regardless of score.
//! Failures inside the audit never escape: they produce a record with score
//! 0 and a single `internal_error` issue.

use crate::entity::{Entity, EntityStore, EntityType, StatusFilter};
use crate::error::Result;
use crate::policy::{IndexingDecision, IndexingPolicy, Priority, WarningKind};
use crate::seo::{
    canonical_url, compose_meta, find_conflicts, plan_headings, robots_meta, ConflictKind,
    MetaProblem, RobotsRules,
};
use crate::seo::meta::{DESCRIPTION_MAX, DESCRIPTION_MIN, TITLE_MAX};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn weight(self) -> u32 {
        match self {
            Severity::Critical => 20,
            Severity::Warning => 10,
            Severity::Info => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    NotIndexable,
    MissingMeta,
    MetaLength,
    ThinContent,
    DuplicateContent,
    IncompleteProfile,
    MissingSlug,
    UnlockedSlug,
    CanonicalConflict,
    RobotsConflict,
    MissingHeadings,
    MissingImage,
    InternalError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

impl Issue {
    pub fn new(issue_type: IssueType, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity,
            message: message.into(),
            field: None,
            expected: None,
            actual: None,
            fix: None,
        }
    }

    pub fn field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn fix(mut self, fix: &str) -> Self {
        self.fix = Some(fix.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Healthy,
    Warning,
    Critical,
}

/// Scores below this are `warning` even without critical issues.
const WARNING_BELOW: u8 = 80;

/// `100 - sum(weights)`, clamped to `[0, 100]`.
pub fn health_score(issues: &[Issue]) -> u8 {
    let penalty: u32 = issues.iter().map(|i| i.severity.weight()).sum();
    100u32.saturating_sub(penalty) as u8
}

pub fn overall_health(score: u8, issues: &[Issue]) -> OverallHealth {
    if issues.iter().any(|i| i.severity == Severity::Critical) {
        OverallHealth::Critical
    } else if score < WARNING_BELOW {
        OverallHealth::Warning
    } else {
        OverallHealth::Healthy
    }
}

fn category_recommendation(issue_type: IssueType) -> Option<&'static str> {
    match issue_type {
        IssueType::ThinContent => {
            Some("Expand page copy with unique, specific detail about this listing")
        }
        IssueType::DuplicateContent => {
            Some("Merge or clearly differentiate near-duplicate listings")
        }
        IssueType::MissingMeta | IssueType::MetaLength => {
            Some("Review title and description fields so snippets read well in results")
        }
        IssueType::MissingSlug | IssueType::UnlockedSlug | IssueType::CanonicalConflict => {
            Some("Ensure every published entity has a unique, locked slug")
        }
        IssueType::IncompleteProfile => Some("Complete all required profile fields"),
        _ => None,
    }
}

/// Deduplicated fixes in first-seen order, then one general recommendation
/// per issue category present.
pub fn recommendations(issues: &[Issue]) -> Vec<String> {
    let mut seen = HashSet::new();
    let fixes = issues.iter().filter_map(|i| i.fix.as_deref());
    let general = issues.iter().filter_map(|i| category_recommendation(i.issue_type));
    fixes
        .chain(general)
        .filter(|r| seen.insert(*r))
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoHealth {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub indexable: bool,
    pub score: u8,
    pub overall_health: OverallHealth,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<String>,
    pub last_checked: DateTime<Utc>,
}

impl SeoHealth {
    /// Score, classify, and summarize a set of issues.
    pub fn from_issues(kind: EntityType, id: &str, indexable: bool, issues: Vec<Issue>) -> Self {
        let score = health_score(&issues);
        Self {
            entity_type: kind,
            entity_id: id.to_string(),
            indexable,
            score,
            overall_health: overall_health(score, &issues),
            recommendations: recommendations(&issues),
            issues,
            last_checked: Utc::now(),
        }
    }

    fn internal_error(kind: EntityType, id: &str, message: String) -> Self {
        let issue = Issue::new(IssueType::InternalError, Severity::Critical, message)
            .fix("Retry the audit; check store connectivity if the failure persists");
        Self {
            score: 0,
            overall_health: OverallHealth::Critical,
            ..Self::from_issues(kind, id, false, vec![issue])
        }
    }

    pub fn has_issue(&self, issue_type: IssueType) -> bool {
        self.issues.iter().any(|i| i.issue_type == issue_type)
    }
}

fn policy_fix(reason: &str) -> &'static str {
    if reason.contains("not found") {
        "Check the entity id"
    } else if reason.contains("not approved") || reason.contains("not published") {
        "Approve or publish the entity"
    } else if reason.contains("Slug") {
        "Generate and lock the slug"
    } else if reason.contains("Incomplete") {
        "Fill in the missing required fields"
    } else {
        "Expand the content and differentiate it from similar listings"
    }
}

fn decision_issues(decision: &IndexingDecision, issues: &mut Vec<Issue>) {
    if !decision.should_index {
        issues.push(
            Issue::new(IssueType::NotIndexable, Severity::Critical, decision.reason.clone())
                .fix(policy_fix(&decision.reason)),
        );
    }
    for warning in &decision.warnings {
        let issue = match warning.kind {
            WarningKind::Incomplete => Issue::new(
                IssueType::IncompleteProfile,
                Severity::Warning,
                warning.message.clone(),
            )
            .fix("Fill in the missing required fields"),
            WarningKind::Duplicate => Issue::new(
                IssueType::DuplicateContent,
                Severity::Warning,
                warning.message.clone(),
            )
            .fix("Differentiate the name and description from similar listings"),
            WarningKind::ThinContent => Issue::new(
                IssueType::ThinContent,
                Severity::Warning,
                warning.message.clone(),
            )
            .fix("Add more descriptive content"),
        };
        issues.push(issue);
    }
}

fn meta_issues(entity: &Entity, issues: &mut Vec<Issue>) {
    let meta = compose_meta(entity);
    for problem in meta.problems() {
        let issue = match problem {
            MetaProblem::MissingTitle => {
                Issue::new(IssueType::MissingMeta, Severity::Critical, "Meta title is empty")
                    .field("title")
                    .fix("Set a name or title")
            }
            MetaProblem::MissingDescription => Issue::new(
                IssueType::MissingMeta,
                Severity::Warning,
                "Meta description is empty",
            )
            .field("description")
            .fix("Add a description or summary"),
            MetaProblem::TitleTooLong { actual } => {
                Issue::new(IssueType::MetaLength, Severity::Warning, "Meta title too long")
                    .field("title")
                    .expected(format!("at most {TITLE_MAX} characters"))
                    .actual(actual.to_string())
            }
            MetaProblem::DescriptionTooLong { actual } => Issue::new(
                IssueType::MetaLength,
                Severity::Warning,
                "Meta description too long",
            )
            .field("description")
            .expected(format!("at most {DESCRIPTION_MAX} characters"))
            .actual(actual.to_string()),
            MetaProblem::DescriptionTooShort { actual } => Issue::new(
                IssueType::MetaLength,
                Severity::Info,
                "Meta description is short",
            )
            .field("description")
            .expected(format!("at least {DESCRIPTION_MIN} characters"))
            .actual(actual.to_string())
            .fix("Add a description or summary"),
        };
        issues.push(issue);
    }
    if meta.og_image.is_none() {
        issues.push(
            Issue::new(IssueType::MissingImage, Severity::Info, "No image for social previews")
                .field("ogImage")
                .fix("Upload a photo or logo"),
        );
    }
}

fn canonical_issues(entity: &Entity, peers: &[Entity], base_url: &str, issues: &mut Vec<Issue>) {
    for conflict in find_conflicts(entity, peers, base_url) {
        let issue = match conflict.kind {
            ConflictKind::MissingSlug => {
                Issue::new(IssueType::MissingSlug, Severity::Critical, conflict.message)
                    .field("slug")
                    .fix("Generate and lock the slug")
            }
            ConflictKind::UnlockedSlug => {
                Issue::new(IssueType::UnlockedSlug, Severity::Warning, conflict.message)
                    .field("slugLocked")
                    .expected("true")
                    .actual("false")
                    .fix("Generate and lock the slug")
            }
            ConflictKind::DuplicateCanonical => {
                Issue::new(IssueType::CanonicalConflict, Severity::Critical, conflict.message)
                    .field("slug")
                    .fix("Give each entity a distinct slug")
            }
        };
        issues.push(issue);
    }
}

fn heading_issues(entity: &Entity, issues: &mut Vec<Issue>) {
    let validation = plan_headings(entity).validate();
    if !validation.valid {
        issues.push(
            Issue::new(IssueType::MissingHeadings, Severity::Critical, "No H1 heading")
                .field("h1")
                .fix("Set a name or title"),
        );
    }
    for warning in validation.warnings {
        issues.push(Issue::new(IssueType::MissingHeadings, Severity::Info, warning));
    }
}

fn robots_issues(
    entity: &Entity,
    decision: &IndexingDecision,
    base_url: &str,
    rules: Option<&RobotsRules>,
    issues: &mut Vec<Issue>,
) {
    let robots = robots_meta(decision);
    if decision.should_index && robots.noindex && decision.priority == Priority::Low {
        issues.push(
            Issue::new(
                IssueType::RobotsConflict,
                Severity::Info,
                "Indexable but served noindex while priority is low",
            )
            .expected("index")
            .actual(robots.content.clone()),
        );
    }

    let (Some(rules), true) = (rules, decision.should_index) else {
        return;
    };
    let Some(path) = canonical_url(entity, base_url)
        .and_then(|url| Url::parse(&url).ok())
        .map(|url| url.path().to_string())
    else {
        return;
    };
    if !rules.is_allowed(&path) {
        issues.push(
            Issue::new(
                IssueType::RobotsConflict,
                Severity::Critical,
                format!("Canonical path {path} is disallowed by robots.txt"),
            )
            .fix("Remove the matching Disallow rule from robots.txt"),
        );
    }
}

pub struct HealthAuditor {
    store: Arc<dyn EntityStore>,
    policy: IndexingPolicy,
    base_url: String,
    robots: Option<RobotsRules>,
    concurrency: usize,
}

impl HealthAuditor {
    pub fn new(store: Arc<dyn EntityStore>, policy: IndexingPolicy, base_url: impl Into<String>) -> Self {
        Self {
            store,
            policy,
            base_url: base_url.into(),
            robots: None,
            concurrency: 8,
        }
    }

    /// Check canonical paths against these robots.txt rules.
    pub fn with_robots_rules(mut self, rules: RobotsRules) -> Self {
        self.robots = Some(rules);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Audit one entity. Never fails.
    pub async fn audit(&self, kind: EntityType, id: &str) -> SeoHealth {
        let health = match self.try_audit(kind, id).await {
            Ok(health) => health,
            Err(e) => {
                warn!(entity_type = %kind, entity_id = id, error = %e, "health audit failed");
                SeoHealth::internal_error(kind, id, e.to_string())
            }
        };
        info!(
            entity_type = %kind,
            entity_id = id,
            score = health.score,
            health = ?health.overall_health,
            issues = health.issues.len(),
            "health audit"
        );
        health
    }

    async fn try_audit(&self, kind: EntityType, id: &str) -> Result<SeoHealth> {
        let mut issues = Vec::new();

        let Some(entity) = self.store.find_by_id(kind, id).await? else {
            let reason = format!("{} not found", kind.label());
            issues.push(
                Issue::new(IssueType::NotIndexable, Severity::Critical, reason.clone())
                    .fix(policy_fix(&reason)),
            );
            return Ok(SeoHealth::from_issues(kind, id, false, issues));
        };

        let decision = self.policy.try_decide_entity(entity.clone()).await?;
        decision_issues(&decision, &mut issues);

        if decision.should_index {
            meta_issues(&entity, &mut issues);
            heading_issues(&entity, &mut issues);
        }

        let peers = self.store.find_many(kind, &StatusFilter::any()).await?;
        canonical_issues(&entity, &peers, &self.base_url, &mut issues);
        robots_issues(&entity, &decision, &self.base_url, self.robots.as_ref(), &mut issues);

        Ok(SeoHealth::from_issues(kind, id, decision.should_index, issues))
    }

    /// Audit many entities concurrently. Results follow input order.
    pub async fn audit_many(&self, targets: &[(EntityType, String)]) -> Vec<SeoHealth> {
        stream::iter(targets)
            .map(|(kind, id)| self.audit(*kind, id))
            .buffered(self.concurrency)
            .collect()
            .await
    }
}
