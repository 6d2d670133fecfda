//! Canonical URL derivation and conflict checks.
//!
//! A canonical exists only for entities with a stable slug: present, and
//! locked for every type that has a lock. Everything else gets `None`.

use crate::entity::{Entity, Indexable};
use serde::{Deserialize, Serialize};

/// Canonical URL for an entity, or `None` while its slug is not stable.
pub fn canonical_url(entity: &impl Indexable, base_url: &str) -> Option<String> {
    if !entity.has_stable_slug() {
        return None;
    }
    let slug = entity.present_slug()?;
    Some(format!(
        "{}/{}/{}",
        base_url.trim_end_matches('/'),
        entity.kind().route_prefix(),
        slug
    ))
}

/// Whether `url` is (or ends with) the entity's canonical URL.
///
/// A single trailing slash on `url` is tolerated. Always false when the
/// entity has no canonical.
pub fn is_canonical(entity: &impl Indexable, base_url: &str, url: &str) -> bool {
    let Some(canonical) = canonical_url(entity, base_url) else {
        return false;
    };
    let url = url.strip_suffix('/').unwrap_or(url);
    url == canonical || url.ends_with(&canonical)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResolution {
    pub canonical_url: Option<String>,
    pub is_canonical: bool,
    pub should_redirect: bool,
}

/// Resolve a requested URL against the entity's canonical.
pub fn resolve_canonical(
    entity: &impl Indexable,
    base_url: &str,
    requested_url: &str,
) -> CanonicalResolution {
    let canonical = canonical_url(entity, base_url);
    let is_canonical = is_canonical(entity, base_url, requested_url);
    CanonicalResolution {
        should_redirect: !is_canonical && canonical.is_some(),
        canonical_url: canonical,
        is_canonical,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    MissingSlug,
    UnlockedSlug,
    DuplicateCanonical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalConflict {
    pub kind: ConflictKind,
    pub message: String,
    /// Peer sharing the canonical, for `DuplicateCanonical`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_id: Option<String>,
}

/// Find everything preventing `entity` from owning a unique canonical URL.
///
/// `peers` is the same-type corpus; the entity itself and other types are
/// ignored.
pub fn find_conflicts(entity: &Entity, peers: &[Entity], base_url: &str) -> Vec<CanonicalConflict> {
    let mut conflicts = Vec::new();

    let Some(slug) = entity.present_slug() else {
        conflicts.push(CanonicalConflict {
            kind: ConflictKind::MissingSlug,
            message: format!("{} has no slug", entity.kind().label()),
            other_id: None,
        });
        return conflicts;
    };

    if entity.kind().has_slug_lock() && !entity.slug_locked() {
        conflicts.push(CanonicalConflict {
            kind: ConflictKind::UnlockedSlug,
            message: format!("Slug '{slug}' is not locked and may still change"),
            other_id: None,
        });
    }

    let Some(canonical) = canonical_url(entity, base_url) else {
        return conflicts;
    };
    for peer in peers {
        if peer.kind() != entity.kind() || peer.id() == entity.id() {
            continue;
        }
        if canonical_url(peer, base_url).as_deref() == Some(canonical.as_str()) {
            conflicts.push(CanonicalConflict {
                kind: ConflictKind::DuplicateCanonical,
                message: format!(
                    "Canonical {canonical} is also claimed by {} {}",
                    peer.kind(),
                    peer.id()
                ),
                other_id: Some(peer.id().to_string()),
            });
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, BASE_URL};

    #[test]
    fn test_routes_per_type() {
        let cases = [
            (Entity::Clinic(testing::clinic("c1", "Smile Dental")), "/clinics/smile-dental"),
            (Entity::Doctor(testing::doctor("d1", "Asha Rao")), "/doctors/asha-rao"),
            (Entity::Job(testing::job("j1", "Dental Assistant")), "/jobs/dental-assistant"),
            (Entity::Blog(testing::blog("b1", "Flossing 101")), "/blog/flossing-101"),
            (Entity::Treatment(testing::treatment("t1", "Root Canal")), "/treatments/root-canal"),
        ];
        for (entity, path) in cases {
            assert_eq!(canonical_url(&entity, BASE_URL), Some(format!("{BASE_URL}{path}")));
        }
    }

    #[test]
    fn test_base_trailing_slash_is_normalized() {
        let clinic = testing::clinic("c1", "Smile Dental");
        assert_eq!(
            canonical_url(&clinic, "https://example.com/").as_deref(),
            Some("https://example.com/clinics/smile-dental")
        );
    }

    #[test]
    fn test_no_canonical_without_stable_slug() {
        let mut clinic = testing::clinic("c1", "Smile Dental");
        clinic.slug_locked = false;
        assert_eq!(canonical_url(&clinic, BASE_URL), None);

        clinic.slug_locked = true;
        clinic.slug = None;
        assert_eq!(canonical_url(&clinic, BASE_URL), None);

        // Treatments have no lock to wait for.
        let treatment = testing::treatment("t1", "Root Canal");
        assert!(canonical_url(&treatment, BASE_URL).is_some());
    }

    #[test]
    fn test_canonical_is_canonical_for_every_type() {
        let entities = [
            Entity::Clinic(testing::clinic("c1", "Smile Dental")),
            Entity::Doctor(testing::doctor("d1", "Asha Rao")),
            Entity::Job(testing::job("j1", "Dental Assistant")),
            Entity::Blog(testing::blog("b1", "Flossing 101")),
            Entity::Treatment(testing::treatment("t1", "Root Canal")),
        ];
        for entity in &entities {
            let canonical = canonical_url(entity, BASE_URL).unwrap();
            assert!(is_canonical(entity, BASE_URL, &canonical), "{canonical}");
            assert!(is_canonical(entity, BASE_URL, &format!("{canonical}/")));
        }
    }

    #[test]
    fn test_resolve_signals_redirect() {
        let clinic = testing::clinic("c1", "Smile Dental");
        let r = resolve_canonical(&clinic, BASE_URL, "https://example.com/clinics/old-name");
        assert!(!r.is_canonical);
        assert!(r.should_redirect);

        let r = resolve_canonical(&clinic, BASE_URL, "https://example.com/clinics/smile-dental");
        assert!(r.is_canonical);
        assert!(!r.should_redirect);

        let mut unlocked = clinic.clone();
        unlocked.slug_locked = false;
        let r = resolve_canonical(&unlocked, BASE_URL, "https://example.com/clinics/anything");
        assert_eq!(r.canonical_url, None);
        assert!(!r.should_redirect);
    }

    #[test]
    fn test_conflicts() {
        let mut unlocked = testing::clinic("c1", "Smile Dental");
        unlocked.slug_locked = false;
        let conflicts = find_conflicts(&Entity::Clinic(unlocked), &[], BASE_URL);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::UnlockedSlug);

        let mut no_slug = testing::clinic("c1", "Smile Dental");
        no_slug.slug = Some(" ".to_string());
        let conflicts = find_conflicts(&Entity::Clinic(no_slug), &[], BASE_URL);
        assert_eq!(conflicts[0].kind, ConflictKind::MissingSlug);

        let me = Entity::Clinic(testing::clinic("c1", "Smile Dental"));
        let peers = vec![
            me.clone(),
            Entity::Clinic(testing::clinic("c2", "Smile Dental")),
            Entity::Doctor(testing::doctor("d1", "Smile Dental")),
        ];
        let conflicts = find_conflicts(&me, &peers, BASE_URL);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::DuplicateCanonical);
        assert_eq!(conflicts[0].other_id.as_deref(), Some("c2"));
    }
}
