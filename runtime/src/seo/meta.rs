//! Title, description, keyword and OpenGraph composition.

use crate::entity::{Blog, Clinic, Doctor, Entity, Job, Treatment};
use crate::error::{Result, SeoError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

pub const TITLE_MAX: usize = 60;
pub const DESCRIPTION_MAX: usize = 160;
/// Descriptions shorter than this read as boilerplate in result snippets.
pub const DESCRIPTION_MIN: usize = 50;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
/// A leading "Dr", "Dr." or "dr." honorific already present in a stored name.
static HONORIFIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^dr(\.\s*|\s+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTags {
    pub title: String,
    pub description: String,
    pub keywords: BTreeSet<String>,
    pub og_title: String,
    pub og_description: String,
    pub og_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

/// One validation finding on composed meta tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaProblem {
    MissingTitle,
    MissingDescription,
    TitleTooLong { actual: usize },
    DescriptionTooLong { actual: usize },
    DescriptionTooShort { actual: usize },
}

impl MetaTags {
    /// Length and presence findings, empty when the tags are usable as-is.
    pub fn problems(&self) -> Vec<MetaProblem> {
        let mut problems = Vec::new();
        let title_len = self.title.chars().count();
        let desc_len = self.description.chars().count();

        if self.title.trim().is_empty() {
            problems.push(MetaProblem::MissingTitle);
        } else if title_len > TITLE_MAX {
            problems.push(MetaProblem::TitleTooLong { actual: title_len });
        }

        if self.description.trim().is_empty() {
            problems.push(MetaProblem::MissingDescription);
        } else if desc_len > DESCRIPTION_MAX {
            problems.push(MetaProblem::DescriptionTooLong { actual: desc_len });
        } else if desc_len < DESCRIPTION_MIN {
            problems.push(MetaProblem::DescriptionTooShort { actual: desc_len });
        }
        problems
    }

    /// Fails only when a required tag is missing entirely.
    pub fn ensure_valid(&self) -> Result<()> {
        for problem in self.problems() {
            match problem {
                MetaProblem::MissingTitle => return Err(SeoError::Meta("empty title".into())),
                MetaProblem::MissingDescription => {
                    return Err(SeoError::Meta("empty description".into()))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Cut to `max - 3` characters and append `...` when over `max`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

/// Plain text from editor markup, whitespace collapsed.
pub fn strip_html(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Per-type field templates. Composed strings are not yet truncated.
trait MetaTemplate {
    fn title(&self) -> String;
    fn description(&self) -> String;
    fn keyword_sources(&self) -> Vec<&str>;
    fn category_keywords(&self) -> &'static [&'static str];
    fn og_type(&self) -> &'static str {
        "website"
    }
}

fn opt(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn name_in_city(name: &str, city: Option<&str>) -> String {
    match city {
        Some(city) => format!("{name} in {city}"),
        None => name.to_string(),
    }
}

impl MetaTemplate for Clinic {
    fn title(&self) -> String {
        name_in_city(self.name.trim(), opt(&self.city))
    }

    fn description(&self) -> String {
        if let Some(about) = opt(&self.about) {
            return strip_html(about);
        }
        let mut out = format!("{} is a verified clinic", self.name.trim());
        if let Some(city) = opt(&self.city) {
            out.push_str(&format!(" in {city}"));
        }
        if !self.treatments.is_empty() {
            let names: Vec<&str> = self.treatments.iter().map(|t| t.name.as_str()).collect();
            out.push_str(&format!(" offering {}", names.join(", ")));
        }
        out.push_str(". Book an appointment today.");
        out
    }

    fn keyword_sources(&self) -> Vec<&str> {
        let mut sources = vec![self.name.as_str()];
        sources.extend(opt(&self.city));
        sources.extend(self.treatments.iter().map(|t| t.name.as_str()));
        sources
    }

    fn category_keywords(&self) -> &'static [&'static str] {
        &["healthcare", "clinic", "appointment", "verified"]
    }
}

fn doctor_name(doctor: &Doctor) -> String {
    let name = doctor.name.trim();
    format!("Dr. {}", HONORIFIC_RE.replace(name, ""))
}

impl MetaTemplate for Doctor {
    fn title(&self) -> String {
        let mut out = doctor_name(self);
        if let Some(degree) = opt(&self.degree) {
            out.push_str(&format!(" - {degree}"));
        }
        if let Some(city) = opt(&self.city) {
            out.push_str(&format!(" in {city}"));
        }
        out
    }

    fn description(&self) -> String {
        let mut out = doctor_name(self);
        if let Some(spec) = opt(&self.specialization) {
            out.push_str(&format!(", {spec}"));
        }
        if let Some(years) = self.experience_years {
            out.push_str(&format!(" with {years} years of experience"));
        }
        if let Some(city) = opt(&self.city) {
            out.push_str(&format!(" in {city}"));
        }
        out.push('.');
        if let Some(bio) = opt(&self.bio) {
            out.push(' ');
            out.push_str(&strip_html(bio));
        }
        out
    }

    fn keyword_sources(&self) -> Vec<&str> {
        let mut sources = vec![self.name.as_str()];
        sources.extend(opt(&self.specialization));
        sources.extend(opt(&self.degree));
        sources.extend(opt(&self.city));
        sources.extend(self.treatments.iter().map(|t| t.name.as_str()));
        sources
    }

    fn category_keywords(&self) -> &'static [&'static str] {
        &["doctor", "healthcare", "appointment", "verified"]
    }

    fn og_type(&self) -> &'static str {
        "profile"
    }
}

impl MetaTemplate for Job {
    fn title(&self) -> String {
        let mut out = self.title.trim().to_string();
        if let Some(company) = opt(&self.company) {
            out.push_str(&format!(" at {company}"));
        }
        if let Some(city) = opt(&self.city) {
            out.push_str(&format!(" in {city}"));
        }
        out
    }

    fn description(&self) -> String {
        let mut out = match opt(&self.employment_type) {
            Some(kind) => format!("{kind} {} position", self.title.trim()),
            None => format!("{} position", self.title.trim()),
        };
        if let Some(company) = opt(&self.company) {
            out.push_str(&format!(" at {company}"));
        }
        if let Some(city) = opt(&self.city) {
            out.push_str(&format!(" in {city}"));
        }
        out.push('.');
        if let Some(desc) = opt(&self.description) {
            out.push(' ');
            out.push_str(&strip_html(desc));
        }
        out
    }

    fn keyword_sources(&self) -> Vec<&str> {
        let mut sources = vec![self.title.as_str()];
        sources.extend(opt(&self.company));
        sources.extend(opt(&self.city));
        sources.extend(opt(&self.employment_type));
        sources
    }

    fn category_keywords(&self) -> &'static [&'static str] {
        &["jobs", "healthcare jobs", "hiring"]
    }
}

impl MetaTemplate for Blog {
    fn title(&self) -> String {
        self.title.trim().to_string()
    }

    fn description(&self) -> String {
        match opt(&self.excerpt) {
            Some(excerpt) => strip_html(excerpt),
            None => strip_html(&self.content),
        }
    }

    fn keyword_sources(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    fn category_keywords(&self) -> &'static [&'static str] {
        &["health", "blog"]
    }

    fn og_type(&self) -> &'static str {
        "article"
    }
}

impl MetaTemplate for Treatment {
    fn title(&self) -> String {
        let name = self.name.trim();
        if name.to_lowercase().ends_with("treatment") {
            name.to_string()
        } else {
            format!("{name} Treatment")
        }
    }

    fn description(&self) -> String {
        match opt(&self.description) {
            Some(desc) => strip_html(desc),
            None => format!(
                "Find verified clinics and doctors offering {}.",
                self.name.trim()
            ),
        }
    }

    fn keyword_sources(&self) -> Vec<&str> {
        let mut sources = vec![self.name.as_str()];
        sources.extend(opt(&self.category));
        sources
    }

    fn category_keywords(&self) -> &'static [&'static str] {
        &["treatment", "healthcare"]
    }
}

fn template(entity: &Entity) -> &dyn MetaTemplate {
    match entity {
        Entity::Clinic(c) => c,
        Entity::Doctor(d) => d,
        Entity::Job(j) => j,
        Entity::Blog(b) => b,
        Entity::Treatment(t) => t,
    }
}

/// Compose meta tags for an entity. Titles and descriptions are truncated
/// to their caps; keywords are lowercased and deduplicated.
pub fn compose_meta(entity: &Entity) -> MetaTags {
    let t = template(entity);
    let title = truncate(&t.title(), TITLE_MAX);
    let description = truncate(&t.description(), DESCRIPTION_MAX);

    let keywords = t
        .keyword_sources()
        .into_iter()
        .chain(t.category_keywords().iter().copied())
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    MetaTags {
        og_title: title.clone(),
        og_description: description.clone(),
        og_type: t.og_type().to_string(),
        og_image: entity.primary_image().map(str::to_string),
        title,
        description,
        keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_title_templates() {
        let clinic = compose_meta(&Entity::Clinic(testing::clinic("c1", "Smile Dental")));
        assert_eq!(clinic.title, "Smile Dental in Pune");

        let doctor = compose_meta(&Entity::Doctor(testing::doctor("d1", "Asha Rao")));
        assert_eq!(doctor.title, "Dr. Asha Rao - BDS in Pune");
        assert_eq!(doctor.og_type, "profile");

        let job = compose_meta(&Entity::Job(testing::job("j1", "Dental Assistant")));
        assert_eq!(job.title, "Dental Assistant at Smile Dental in Pune");

        let blog = compose_meta(&Entity::Blog(testing::blog("b1", "Flossing for Beginners")));
        assert_eq!(blog.title, "Flossing for Beginners");

        let treatment = compose_meta(&Entity::Treatment(testing::treatment("t1", "Root Canal")));
        assert_eq!(treatment.title, "Root Canal Treatment");
    }

    #[test]
    fn test_doctor_prefix_not_doubled() {
        for name in ["Dr. Asha Rao", "Dr Asha Rao", "dr. Asha Rao", "DR.Asha Rao", "Asha Rao"] {
            let meta = compose_meta(&Entity::Doctor(testing::doctor("d1", name)));
            assert_eq!(meta.title, "Dr. Asha Rao - BDS in Pune", "{name}");
        }

        // A name that merely starts with the letters keeps them.
        let meta = compose_meta(&Entity::Doctor(testing::doctor("d2", "Drew Carter")));
        assert!(meta.title.starts_with("Dr. Drew Carter"));
    }

    #[test]
    fn test_long_blog_title_truncated_to_cap() {
        let title = "A".repeat(80);
        let meta = compose_meta(&Entity::Blog(testing::blog("b1", &title)));
        assert_eq!(meta.title.chars().count(), 60);
        assert!(meta.title.ends_with("..."));
        assert_eq!(meta.og_title, meta.title);
    }

    #[test]
    fn test_lengths_within_caps() {
        let mut clinic = testing::clinic("c1", &"Very Long Clinic Name ".repeat(5));
        clinic.about = Some("word ".repeat(100));
        let entities = [
            Entity::Clinic(clinic),
            Entity::Doctor(testing::doctor("d1", &"Name ".repeat(20))),
            Entity::Job(testing::job("j1", "Dental Assistant")),
            Entity::Blog(testing::blog("b1", "Flossing for Beginners")),
        ];
        for entity in &entities {
            let meta = compose_meta(entity);
            assert!(meta.title.chars().count() <= TITLE_MAX, "{}", meta.title);
            assert!(meta.description.chars().count() <= DESCRIPTION_MAX);
        }
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 60), "short");
        let t = truncate(&"é".repeat(70), 60);
        assert_eq!(t.chars().count(), 60);
        assert!(t.ends_with("..."));
    }

    #[test]
    fn test_blog_description_strips_markup() {
        let meta = compose_meta(&Entity::Blog(testing::blog("b1", "Flossing for Beginners")));
        assert!(!meta.description.contains('<'));
        assert!(meta.description.starts_with("Flossing for Beginners: a practical guide."));
    }

    #[test]
    fn test_keywords_lowercase_deduped_with_category_terms() {
        let mut clinic = testing::clinic("c1", "Smile Dental");
        clinic.treatments.push(clinic.treatments[0].clone());
        let meta = compose_meta(&Entity::Clinic(clinic));
        for term in ["healthcare", "clinic", "appointment", "verified", "pune", "root canal"] {
            assert!(meta.keywords.contains(term), "missing {term}");
        }
        assert!(meta.keywords.iter().all(|k| k == &k.to_lowercase()));
        assert_eq!(meta.keywords.iter().filter(|k| *k == "root canal").count(), 1);
    }

    #[test]
    fn test_og_image_from_first_photo() {
        let meta = compose_meta(&Entity::Clinic(testing::clinic("c1", "Smile Dental")));
        assert_eq!(
            meta.og_image.as_deref(),
            Some("https://cdn.example.com/smile-dental.jpg")
        );
        let meta = compose_meta(&Entity::Job(testing::job("j1", "Dental Assistant")));
        assert_eq!(meta.og_image, None);
    }

    #[test]
    fn test_problems_and_validation() {
        let mut meta = compose_meta(&Entity::Clinic(testing::clinic("c1", "Smile Dental")));
        assert!(meta.problems().is_empty());
        assert!(meta.ensure_valid().is_ok());

        meta.description = "Short.".to_string();
        assert_eq!(
            meta.problems(),
            vec![MetaProblem::DescriptionTooShort { actual: 6 }]
        );
        assert!(meta.ensure_valid().is_ok());

        meta.title = "  ".to_string();
        assert!(meta.problems().contains(&MetaProblem::MissingTitle));
        assert!(meta.ensure_valid().is_err());
    }
}
