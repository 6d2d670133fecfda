//! Heading outline planning.
//!
//! The H1 is always the entity's name or title. H2s come from a fixed list of
//! structural conditions per type, checked in order; blogs instead reuse the
//! headings already present in their markup.

use crate::entity::types::present;
use crate::entity::{Blog, Clinic, Doctor, Entity, Indexable, Job, Treatment};
use crate::error::{Result, SeoError};
use crate::seo::meta::strip_html;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h([23])[^>]*>(.*?)</h[23]\s*>").unwrap());

const BLOG_DEFAULT: [&str; 3] = ["Introduction", "Main Content", "Conclusion"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingPlan {
    pub h1: String,
    pub h2: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub h3: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingValidation {
    pub valid: bool,
    pub warnings: Vec<String>,
}

impl HeadingPlan {
    pub fn validate(&self) -> HeadingValidation {
        let mut warnings = Vec::new();
        if self.h2.is_empty() {
            warnings.push("No H2 headings planned".to_string());
        }
        HeadingValidation {
            valid: !self.h1.trim().is_empty(),
            warnings,
        }
    }

    pub fn ensure_valid(&self) -> Result<()> {
        if self.h1.trim().is_empty() {
            return Err(SeoError::Headings("empty h1".to_string()));
        }
        Ok(())
    }
}

/// Ordered `(condition, heading)` pairs; the default is used when none hold.
fn conditional(rules: &[(bool, &str)], default: [&str; 3]) -> Vec<String> {
    let fired: Vec<String> = rules
        .iter()
        .filter(|(holds, _)| *holds)
        .map(|(_, heading)| heading.to_string())
        .collect();
    if fired.is_empty() {
        default.iter().map(|s| s.to_string()).collect()
    } else {
        fired
    }
}

fn clinic_h2(c: &Clinic) -> Vec<String> {
    conditional(
        &[
            (!c.treatments.is_empty(), "Our Treatments & Services"),
            (present(&c.address), "Location & Contact"),
            (c.pricing.is_some(), "Pricing & Consultation Fees"),
            (!c.timings.is_empty(), "Operating Hours"),
        ],
        ["About Us", "Services", "Contact"],
    )
}

fn doctor_h2(d: &Doctor) -> Vec<String> {
    conditional(
        &[
            (present(&d.bio), "About the Doctor"),
            (!d.treatments.is_empty(), "Treatments Offered"),
            (
                present(&d.degree) || d.experience_years.is_some(),
                "Qualifications & Experience",
            ),
            (present(&d.address) || present(&d.city), "Clinic Location"),
            (d.consultation_fee.is_some(), "Consultation Fees"),
        ],
        ["About", "Qualifications", "Book an Appointment"],
    )
}

fn job_h2(j: &Job) -> Vec<String> {
    conditional(
        &[
            (present(&j.description), "Job Description"),
            (!j.requirements.is_empty(), "Requirements"),
            (present(&j.salary), "Salary & Benefits"),
            (present(&j.company), "About the Company"),
        ],
        ["Overview", "Responsibilities", "How to Apply"],
    )
}

fn treatment_h2(t: &Treatment) -> Vec<String> {
    conditional(
        &[
            (present(&t.description), "About This Treatment"),
            (present(&t.category), "Treatment Category"),
        ],
        ["Overview", "Benefits", "Find a Specialist"],
    )
}

/// H2 and H3 text found in the blog markup, in document order.
fn blog_headings(blog: &Blog) -> (Vec<String>, Vec<String>) {
    let mut h2 = Vec::new();
    let mut h3 = Vec::new();
    for cap in HEADING_RE.captures_iter(&blog.content) {
        let text = strip_html(&cap[2]);
        if text.is_empty() {
            continue;
        }
        if &cap[1] == "2" {
            h2.push(text);
        } else {
            h3.push(text);
        }
    }
    if h2.is_empty() {
        h2 = BLOG_DEFAULT.iter().map(|s| s.to_string()).collect();
    }
    (h2, h3)
}

/// Keep first occurrences, case-insensitively, skipping anything in `seen`.
fn dedupe(items: Vec<String>, seen: &mut HashSet<String>) -> Vec<String> {
    items
        .into_iter()
        .filter(|item| seen.insert(item.trim().to_lowercase()))
        .collect()
}

/// Plan the heading outline for an entity.
pub fn plan_headings(entity: &Entity) -> HeadingPlan {
    let h1 = entity.display_name().trim().to_string();
    let (h2, h3) = match entity {
        Entity::Clinic(c) => (clinic_h2(c), c.treatments.iter().map(|t| t.name.clone()).collect()),
        Entity::Doctor(d) => (doctor_h2(d), d.treatments.iter().map(|t| t.name.clone()).collect()),
        Entity::Job(j) => (job_h2(j), Vec::new()),
        Entity::Blog(b) => blog_headings(b),
        Entity::Treatment(t) => (treatment_h2(t), Vec::new()),
    };

    let mut seen = HashSet::from([h1.to_lowercase()]);
    let h2 = dedupe(h2, &mut seen);
    let h3 = dedupe(h3, &mut seen);
    HeadingPlan { h1, h2, h3 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_clinic_outline() {
        let plan = plan_headings(&Entity::Clinic(testing::clinic("c1", "Smile Dental")));
        assert_eq!(plan.h1, "Smile Dental");
        assert_eq!(
            plan.h2,
            vec![
                "Our Treatments & Services",
                "Location & Contact",
                "Pricing & Consultation Fees",
                "Operating Hours",
            ]
        );
        assert_eq!(plan.h3, vec!["Root Canal", "Teeth Whitening"]);
    }

    #[test]
    fn test_bare_clinic_uses_default_triple() {
        let clinic = Clinic {
            name: "Smile Dental".to_string(),
            ..Clinic::default()
        };
        let plan = plan_headings(&Entity::Clinic(clinic));
        assert_eq!(plan.h2, vec!["About Us", "Services", "Contact"]);
        assert!(plan.h3.is_empty());
    }

    #[test]
    fn test_blog_extracts_markup_headings() {
        let plan = plan_headings(&Entity::Blog(testing::blog("b1", "Flossing for Beginners")));
        assert_eq!(plan.h2, vec!["Why it matters", "When to see a dentist"]);
        assert_eq!(plan.h3, vec!["Daily routine"]);
    }

    #[test]
    fn test_blog_heading_with_nested_markup() {
        let blog = Blog {
            content: r#"<H2 class="x">Brushing <em>well</em></H2><p>text</p>"#.to_string(),
            ..testing::blog("b1", "Brushing Guide")
        };
        let plan = plan_headings(&Entity::Blog(blog));
        assert_eq!(plan.h2, vec!["Brushing well"]);
    }

    #[test]
    fn test_blog_without_headings_uses_default() {
        let blog = Blog {
            content: "<p>No structure at all.</p>".to_string(),
            ..testing::blog("b1", "Flossing for Beginners")
        };
        let plan = plan_headings(&Entity::Blog(blog));
        assert_eq!(plan.h2, vec!["Introduction", "Main Content", "Conclusion"]);
    }

    #[test]
    fn test_no_heading_repeats_h1_or_itself() {
        let mut clinic = testing::clinic("c1", "Root Canal");
        clinic.treatments.push(clinic.treatments[1].clone());
        let plan = plan_headings(&Entity::Clinic(clinic));
        assert_eq!(plan.h3, vec!["Teeth Whitening"]);
    }

    #[test]
    fn test_validation() {
        let plan = plan_headings(&Entity::Job(testing::job("j1", "Dental Assistant")));
        let v = plan.validate();
        assert!(v.valid);
        assert!(v.warnings.is_empty());

        let empty = HeadingPlan {
            h1: " ".to_string(),
            h2: Vec::new(),
            h3: Vec::new(),
        };
        let v = empty.validate();
        assert!(!v.valid);
        assert_eq!(v.warnings.len(), 1);
        assert!(empty.ensure_valid().is_err());
    }
}
