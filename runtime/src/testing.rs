//! Fixtures for pipeline tests.
//!
//! Builders return complete, approved, slug-locked entities so each test only
//! has to break the one property it cares about. Failing collaborators cover
//! the store and sitemap sink boundaries. Compiled for unit tests and behind
//! the `testing` feature.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::entity::{
    ApprovalStatus, Blog, Clinic, Doctor, Entity, EntityStore, EntityType, Job, Pricing,
    PublishStatus, StatusFilter, Timing, Treatment, TreatmentRef,
};
use crate::error::{Result, SeoError};
use crate::sitemap::SitemapSink;

pub const BASE_URL: &str = "https://example.com";

/// Lowercase, hyphen-separated slug.
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn fixed_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn treatments() -> Vec<TreatmentRef> {
    vec![
        TreatmentRef {
            id: "t1".to_string(),
            name: "Root Canal".to_string(),
        },
        TreatmentRef {
            id: "t2".to_string(),
            name: "Teeth Whitening".to_string(),
        },
    ]
}

pub fn clinic(id: &str, name: &str) -> Clinic {
    Clinic {
        id: id.to_string(),
        name: name.to_string(),
        slug: Some(slugify(name)),
        slug_locked: true,
        status: ApprovalStatus::Approved,
        address: Some("12 MG Road, Camp".to_string()),
        city: Some("Pune".to_string()),
        state: Some("Maharashtra".to_string()),
        phone: Some("+91 20 5555 0101".to_string()),
        about: Some(format!(
            "{name} is a family dental practice offering preventive care, cosmetic \
             dentistry, and same-day emergency appointments with experienced staff."
        )),
        pricing: Some(Pricing {
            consultation_fee: Some(500.0),
            currency: Some("INR".to_string()),
            notes: None,
        }),
        timings: vec![Timing {
            day: "Monday".to_string(),
            open: "09:00".to_string(),
            close: "18:00".to_string(),
        }],
        treatments: treatments(),
        photos: vec![format!("https://cdn.example.com/{}.jpg", slugify(name))],
        updated_at: Some(fixed_time()),
    }
}

pub fn doctor(id: &str, name: &str) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: name.to_string(),
        slug: Some(slugify(name)),
        slug_locked: true,
        status: ApprovalStatus::Approved,
        degree: Some("BDS".to_string()),
        specialization: Some("Orthodontist".to_string()),
        experience_years: Some(8),
        city: Some("Pune".to_string()),
        address: Some("12 MG Road, Camp".to_string()),
        bio: Some(format!(
            "Dr. {name} specializes in braces and clear aligners and has treated \
             hundreds of patients across Pune over the last eight years."
        )),
        consultation_fee: Some(700.0),
        treatments: treatments(),
        photo: Some(format!("https://cdn.example.com/dr-{}.jpg", slugify(name))),
        updated_at: Some(fixed_time()),
    }
}

pub fn job(id: &str, title: &str) -> Job {
    Job {
        id: id.to_string(),
        title: title.to_string(),
        company: Some("Smile Dental".to_string()),
        slug: Some(slugify(title)),
        slug_locked: true,
        status: ApprovalStatus::Approved,
        is_active: true,
        city: Some("Pune".to_string()),
        description: Some(format!(
            "We are hiring a {title} to join our growing clinic. You will work with \
             dentists and hygienists, manage patient records, prepare treatment rooms, \
             and help deliver a calm, friendly experience to every patient who visits."
        )),
        requirements: vec!["1+ years experience".to_string()],
        employment_type: Some("Full-time".to_string()),
        salary: Some("INR 25,000 / month".to_string()),
        company_logo: None,
        updated_at: Some(fixed_time()),
    }
}

pub fn blog(id: &str, title: &str) -> Blog {
    Blog {
        id: id.to_string(),
        title: title.to_string(),
        slug: Some(slugify(title)),
        slug_locked: true,
        status: PublishStatus::Published,
        content: format!(
            "<p>{title}: a practical guide.</p><h2>Why it matters</h2>\
             <p>Good habits prevent most dental problems before they start.</p>\
             <h3>Daily routine</h3><p>Brush twice, floss once, and visit every six months.</p>\
             <h2>When to see a dentist</h2><p>Pain, swelling, or bleeding gums need attention.</p>"
        ),
        excerpt: None,
        tags: vec!["Dental Care".to_string(), "Hygiene".to_string()],
        author: Some("Editorial Team".to_string()),
        cover_image: Some(format!("https://cdn.example.com/blog/{}.jpg", slugify(title))),
        updated_at: Some(fixed_time()),
    }
}

pub fn treatment(id: &str, name: &str) -> Treatment {
    Treatment {
        id: id.to_string(),
        name: name.to_string(),
        slug: Some(slugify(name)),
        status: ApprovalStatus::Approved,
        description: Some(format!(
            "{name} is a common dental procedure performed by verified specialists."
        )),
        category: Some("Dental".to_string()),
        image: None,
        updated_at: Some(fixed_time()),
    }
}

/// `n` live clinics with long, distinct names. A duplicate scan over this
/// corpus takes long enough to reliably overrun a near-zero scan timeout.
pub fn slow_clinic_corpus(n: usize) -> Vec<Entity> {
    let filler = "Multi Speciality Dental and Orthodontic Care Centre ".repeat(5);
    (0..n)
        .map(|i| Entity::Clinic(clinic(&format!("c{i}"), &format!("{filler}Branch {i}"))))
        .collect()
}

/// Store whose every query fails.
pub struct FailingStore;

#[async_trait]
impl EntityStore for FailingStore {
    async fn find_by_id(&self, _kind: EntityType, _id: &str) -> Result<Option<Entity>> {
        Err(SeoError::Store("connection refused".to_string()))
    }

    async fn find_many(&self, _kind: EntityType, _filter: &StatusFilter) -> Result<Vec<Entity>> {
        Err(SeoError::Store("connection refused".to_string()))
    }
}

/// Sitemap sink whose every write fails.
pub struct FailingSink;

#[async_trait]
impl SitemapSink for FailingSink {
    async fn write(&self, name: &str, _xml: &str) -> Result<()> {
        Err(SeoError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("cannot write {name}"),
        )))
    }
}
