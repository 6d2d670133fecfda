//! Near-duplicate detection across a same-type corpus.
//!
//! Every candidate is compared against every live peer of the same type, so a
//! check costs O(corpus size x field length^2). `check_bounded` caps the
//! wall-clock time of one scan.

use crate::entity::types::{Entity, EntityType, Indexable};
use crate::error::{Result, SeoError};
use crate::policy::similarity::combined_similarity;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Maximum number of similar entities reported.
pub const MAX_SIMILAR: usize = 5;

/// Blog content is compared on its first 500 characters.
const BLOG_CONTENT_PREFIX: usize = 500;

/// Qualitative bucket for a similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// A peer that scored above the inclusion floor or matched exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarEntity {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub similarity: f64,
}

/// Result of a duplicate scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub confidence: Confidence,
    pub reason: String,
    /// At most `MAX_SIMILAR`, sorted by similarity descending.
    pub similar_entities: Vec<SimilarEntity>,
}

impl DuplicateCheck {
    fn unique() -> Self {
        Self {
            is_duplicate: false,
            confidence: Confidence::Low,
            reason: "No duplicates detected".to_string(),
            similar_entities: Vec::new(),
        }
    }
}

/// Per-type score cutoffs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Peers scoring above this are recorded.
    pub floor: f64,
    /// Maximum score above this is medium confidence.
    pub medium: f64,
    /// Maximum score above this is high confidence.
    pub high: f64,
}

impl Thresholds {
    pub fn for_type(kind: EntityType) -> Self {
        match kind {
            EntityType::Clinic | EntityType::Doctor => Self {
                floor: 0.85,
                medium: 0.87,
                high: 0.9,
            },
            EntityType::Job | EntityType::Blog => Self {
                floor: 0.8,
                medium: 0.85,
                high: 0.9,
            },
            EntityType::Treatment => Self {
                floor: 0.87,
                medium: 0.87,
                high: 0.9,
            },
        }
    }

    fn confidence(&self, score: f64) -> Confidence {
        if score > self.high {
            Confidence::High
        } else if score > self.medium {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Weighted fields compared between two entities of the same type.
fn comparison_fields(entity: &Entity) -> Vec<(f64, Cow<'_, str>)> {
    fn opt(field: &Option<String>) -> Cow<'_, str> {
        Cow::Borrowed(field.as_deref().unwrap_or("").trim())
    }

    match entity {
        Entity::Clinic(c) => vec![(0.7, Cow::Borrowed(c.name.trim())), (0.3, opt(&c.address))],
        Entity::Doctor(d) => vec![
            (0.6, Cow::Borrowed(d.name.trim())),
            (0.2, opt(&d.address)),
            (0.2, opt(&d.degree)),
        ],
        Entity::Job(j) => vec![(0.6, Cow::Borrowed(j.title.trim())), (0.4, opt(&j.company))],
        Entity::Blog(b) => vec![
            (0.6, Cow::Borrowed(b.title.trim())),
            (
                0.4,
                Cow::Owned(b.content.chars().take(BLOG_CONTENT_PREFIX).collect()),
            ),
        ],
        Entity::Treatment(t) => vec![(1.0, Cow::Borrowed(t.name.trim()))],
    }
}

/// Combined weighted similarity between two entities of the same type.
pub fn entity_similarity(a: &Entity, b: &Entity) -> f64 {
    let fa = comparison_fields(a);
    let fb = comparison_fields(b);
    let pairs: Vec<(f64, &str, &str)> = fa
        .iter()
        .zip(fb.iter())
        .map(|((w, x), (_, y))| (*w, x.as_ref(), y.as_ref()))
        .collect();
    combined_similarity(&pairs)
}

fn is_exact_match(a: &Entity, b: &Entity) -> bool {
    let x = a.display_name().trim().to_lowercase();
    !x.is_empty() && x == b.display_name().trim().to_lowercase()
}

/// Scans a corpus for near-duplicates of a candidate entity.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateDetector {
    scan_timeout: Duration,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl DuplicateDetector {
    pub fn new(scan_timeout: Duration) -> Self {
        Self { scan_timeout }
    }

    /// Compare a candidate against live peers of its own type.
    ///
    /// An exact case-insensitive match on the name or title always yields
    /// high confidence, whatever the other fields score.
    pub fn check(&self, candidate: &Entity, corpus: &[Entity]) -> DuplicateCheck {
        let kind = candidate.kind();
        let thresholds = Thresholds::for_type(kind);

        let mut exact = 0usize;
        let mut similar: Vec<SimilarEntity> = Vec::new();

        for peer in corpus {
            if peer.kind() != kind || !peer.is_live() || peer.id() == candidate.id() {
                continue;
            }

            let score = entity_similarity(candidate, peer);
            let exact_match = is_exact_match(candidate, peer);
            if exact_match {
                exact += 1;
            }

            if exact_match || score > thresholds.floor {
                similar.push(SimilarEntity {
                    id: peer.id().to_string(),
                    name: peer.display_name().to_string(),
                    slug: peer.present_slug().map(String::from),
                    similarity: score,
                });
            }
        }

        if similar.is_empty() {
            return DuplicateCheck::unique();
        }

        similar.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        similar.truncate(MAX_SIMILAR);

        let (confidence, reason) = if exact > 0 {
            let field = match kind {
                EntityType::Job | EntityType::Blog => "title",
                _ => "name",
            };
            (
                Confidence::High,
                format!(
                    "Exact {field} match with {exact} approved {}",
                    if exact == 1 { kind.to_string() } else { kind.plural().to_string() }
                ),
            )
        } else {
            let max = similar[0].similarity;
            (
                thresholds.confidence(max),
                format!(
                    "Found {} similar {} (max similarity {:.2})",
                    similar.len(),
                    if similar.len() == 1 { kind.to_string() } else { kind.plural().to_string() },
                    max
                ),
            )
        };

        debug!(
            entity_type = %kind,
            entity_id = candidate.id(),
            matches = similar.len(),
            ?confidence,
            "duplicate scan"
        );

        DuplicateCheck {
            is_duplicate: true,
            confidence,
            reason,
            similar_entities: similar,
        }
    }

    /// Run `check` on the blocking pool, giving up after the scan timeout.
    ///
    /// On timeout the scan thread is left to finish in the background; its
    /// result is discarded.
    /// The corpus is shared so a caller scanning many candidates against one
    /// corpus does not copy it per scan.
    pub async fn check_bounded(&self, candidate: Entity, corpus: Arc<[Entity]>) -> Result<DuplicateCheck> {
        let detector = *self;
        let task = tokio::task::spawn_blocking(move || detector.check(&candidate, &corpus));

        match tokio::time::timeout(self.scan_timeout, task).await {
            Ok(Ok(check)) => Ok(check),
            Ok(Err(e)) => Err(SeoError::Task(format!("duplicate scan: {e}"))),
            Err(_) => Err(SeoError::Timeout {
                what: "duplicate scan".to_string(),
                ms: self.scan_timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ApprovalStatus;
    use crate::testing;

    fn clinic(id: &str, name: &str) -> Entity {
        Entity::Clinic(testing::clinic(id, name))
    }

    #[test]
    fn test_exact_name_match_is_high_confidence() {
        let mut other = testing::clinic("c2", "smile dental");
        other.address = Some("99 Completely Different Street, Nashik".to_string());
        let corpus = vec![Entity::Clinic(other)];

        let check = DuplicateDetector::default().check(&clinic("c1", "Smile Dental"), &corpus);
        assert!(check.is_duplicate);
        assert_eq!(check.confidence, Confidence::High);
        assert_eq!(check.similar_entities.len(), 1);
        assert!(check.reason.contains("Exact name match"));
    }

    #[test]
    fn test_two_approved_clinics_same_name() {
        let corpus = vec![clinic("c1", "Smile Dental"), clinic("c2", "Smile Dental")];
        let check = DuplicateDetector::default().check(&corpus[0], &corpus);
        assert!(check.is_duplicate);
        assert_eq!(check.confidence, Confidence::High);
        assert_eq!(check.similar_entities[0].id, "c2");
        assert_eq!(check.similar_entities[0].similarity, 1.0);
    }

    #[test]
    fn test_unapproved_peers_are_ignored() {
        let mut pending = testing::clinic("c2", "Smile Dental");
        pending.status = ApprovalStatus::Pending;
        let check = DuplicateDetector::default()
            .check(&clinic("c1", "Smile Dental"), &[Entity::Clinic(pending)]);
        assert!(!check.is_duplicate);
        assert_eq!(check.reason, "No duplicates detected");
    }

    #[test]
    fn test_candidate_is_not_its_own_duplicate() {
        let c = clinic("c1", "Smile Dental");
        let check = DuplicateDetector::default().check(&c, std::slice::from_ref(&c));
        assert!(!check.is_duplicate);
    }

    #[test]
    fn test_near_match_above_floor_is_recorded() {
        // One-letter difference in the name, same address.
        let check = DuplicateDetector::default()
            .check(&clinic("c1", "Smile Dental Care"), &[clinic("c2", "Smile Dental Cure")]);
        assert!(check.is_duplicate);
        assert!(check.similar_entities[0].similarity > 0.9);
        assert_eq!(check.confidence, Confidence::High);
    }

    #[test]
    fn test_unrelated_names_are_unique() {
        let check = DuplicateDetector::default()
            .check(&clinic("c1", "Smile Dental"), &[clinic("c2", "Pune Eye Hospital")]);
        assert!(!check.is_duplicate);
        assert!(check.similar_entities.is_empty());
    }

    #[test]
    fn test_results_sorted_and_truncated() {
        let names = [
            "Smile Dental A",
            "Smile Dental B",
            "Smile Dental",
            "Smile Dentals",
            "Smile Dental CC",
            "Smile Dental DD",
            "Smile Dental EEE",
        ];
        let corpus: Vec<Entity> = names
            .iter()
            .enumerate()
            .map(|(i, n)| clinic(&format!("p{i}"), n))
            .collect();

        let check = DuplicateDetector::default().check(&clinic("c0", "Smile Dental"), &corpus);
        assert_eq!(check.similar_entities.len(), MAX_SIMILAR);
        assert_eq!(check.similar_entities[0].name, "Smile Dental");
        for pair in check.similar_entities.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn test_job_weights_title_and_company() {
        let a = Entity::Job(testing::job("j1", "Dental Assistant"));
        let mut other = testing::job("j2", "Dental Assistant");
        other.company = Some("Bright Smiles".to_string());
        let b = Entity::Job(other);
        let s = entity_similarity(&a, &b);
        // Title identical (0.6), company partially similar.
        assert!(s >= 0.6 && s < 1.0);
    }

    #[test]
    fn test_thresholds_by_type() {
        assert_eq!(Thresholds::for_type(EntityType::Clinic).floor, 0.85);
        assert_eq!(Thresholds::for_type(EntityType::Blog).floor, 0.8);
        let t = Thresholds::for_type(EntityType::Job);
        assert_eq!(t.confidence(0.95), Confidence::High);
        assert_eq!(t.confidence(0.86), Confidence::Medium);
        assert_eq!(t.confidence(0.81), Confidence::Low);
    }

    #[test]
    fn test_doctor_weights_name_address_degree() {
        let a = Entity::Doctor(testing::doctor("d1", "Asha Rao"));

        let mut other_degree = testing::doctor("d2", "Asha Rao");
        other_degree.degree = Some("MDS".to_string());
        let s = entity_similarity(&a, &Entity::Doctor(other_degree));
        // Name and address identical, "BDS" vs "MDS" is one edit in three.
        assert!((s - (0.6 + 0.2 + 0.2 * (2.0 / 3.0))).abs() < 1e-9, "{s}");

        let mut no_address = testing::doctor("d3", "Asha Rao");
        no_address.address = None;
        let s = entity_similarity(&a, &Entity::Doctor(no_address));
        assert!((s - 0.8).abs() < 1e-9, "{s}");
    }

    #[test]
    fn test_blog_weights_title_and_content_prefix() {
        let shared = "x".repeat(BLOG_CONTENT_PREFIX);
        let mut a = testing::blog("b1", "Flossing for Beginners");
        a.content = format!("{shared}<p>first ending</p>");
        let mut b = testing::blog("b2", "Flossing for Beginners");
        b.content = format!("{shared}<p>an entirely different second ending</p>");

        // Only the first 500 content characters are compared.
        let s = entity_similarity(&Entity::Blog(a.clone()), &Entity::Blog(b.clone()));
        assert!((s - 1.0).abs() < 1e-9, "{s}");

        b.content.clear();
        let s = entity_similarity(&Entity::Blog(a), &Entity::Blog(b));
        assert!((s - 0.6).abs() < 1e-9, "{s}");
    }

    #[test]
    fn test_treatment_floor_is_stricter() {
        let candidate = Entity::Treatment(testing::treatment("t1", "Teeth Whitening"));

        // Two edits in fifteen characters scores 0.867, under the 0.87 floor.
        let below = [Entity::Treatment(testing::treatment("t2", "Teeth Whiteni"))];
        let check = DuplicateDetector::default().check(&candidate, &below);
        assert!(!check.is_duplicate);

        // One edit scores 0.933.
        let above = [Entity::Treatment(testing::treatment("t3", "Teeth Whitenin"))];
        let check = DuplicateDetector::default().check(&candidate, &above);
        assert!(check.is_duplicate);
        assert_eq!(check.confidence, Confidence::High);
        assert_eq!(check.similar_entities[0].id, "t3");
    }

    #[tokio::test]
    async fn test_check_bounded_times_out() {
        let corpus = testing::slow_clinic_corpus(300);
        let err = DuplicateDetector::new(Duration::from_millis(1))
            .check_bounded(corpus[0].clone(), corpus.into())
            .await
            .unwrap_err();
        assert!(matches!(err, SeoError::Timeout { ms: 1, .. }));
        assert_eq!(err.to_string(), "duplicate scan timed out after 1ms");
    }

    #[tokio::test]
    async fn test_check_bounded_returns_result() {
        let corpus = vec![clinic("c2", "Smile Dental")];
        let check = DuplicateDetector::new(Duration::from_secs(5))
            .check_bounded(clinic("c1", "Smile Dental"), corpus.into())
            .await
            .unwrap();
        assert!(check.is_duplicate);
    }
}
