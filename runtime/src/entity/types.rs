//! Content entities and the shared `Indexable` capability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of content entity handled by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Clinic,
    Doctor,
    Job,
    Blog,
    Treatment,
}

impl EntityType {
    pub const ALL: [EntityType; 5] = [
        EntityType::Clinic,
        EntityType::Doctor,
        EntityType::Job,
        EntityType::Blog,
        EntityType::Treatment,
    ];

    /// Types that get their own sitemap file.
    pub const SITEMAP_TYPES: [EntityType; 4] = [
        EntityType::Clinic,
        EntityType::Doctor,
        EntityType::Job,
        EntityType::Blog,
    ];

    /// Capitalized label used in decision reasons ("Clinic not found").
    pub fn label(self) -> &'static str {
        match self {
            EntityType::Clinic => "Clinic",
            EntityType::Doctor => "Doctor",
            EntityType::Job => "Job",
            EntityType::Blog => "Blog",
            EntityType::Treatment => "Treatment",
        }
    }

    /// Plural form used in sitemap file names.
    pub fn plural(self) -> &'static str {
        match self {
            EntityType::Clinic => "clinics",
            EntityType::Doctor => "doctors",
            EntityType::Job => "jobs",
            EntityType::Blog => "blogs",
            EntityType::Treatment => "treatments",
        }
    }

    /// First path segment of the public route.
    pub fn route_prefix(self) -> &'static str {
        match self {
            EntityType::Clinic => "clinics",
            EntityType::Doctor => "doctors",
            EntityType::Job => "jobs",
            EntityType::Blog => "blog",
            EntityType::Treatment => "treatments",
        }
    }

    /// Treatments are taxonomy entries and have no slug lock.
    pub fn has_slug_lock(self) -> bool {
        self != EntityType::Treatment
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityType::Clinic => "clinic",
            EntityType::Doctor => "doctor",
            EntityType::Job => "job",
            EntityType::Blog => "blog",
            EntityType::Treatment => "treatment",
        })
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clinic" | "clinics" => Ok(EntityType::Clinic),
            "doctor" | "doctors" => Ok(EntityType::Doctor),
            "job" | "jobs" => Ok(EntityType::Job),
            "blog" | "blogs" => Ok(EntityType::Blog),
            "treatment" | "treatments" => Ok(EntityType::Treatment),
            other => Err(format!("unknown entity type '{other}'")),
        }
    }
}

/// Moderation state for clinics, doctors, jobs, and treatments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Publication state for blog posts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub consultation_fee: Option<f64>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub day: String,
    pub open: String,
    pub close: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Clinic {
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    pub slug_locked: bool,
    pub status: ApprovalStatus,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
    pub about: Option<String>,
    pub pricing: Option<Pricing>,
    pub timings: Vec<Timing>,
    pub treatments: Vec<TreatmentRef>,
    pub photos: Vec<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    pub slug_locked: bool,
    pub status: ApprovalStatus,
    pub degree: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: Option<u32>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub consultation_fee: Option<f64>,
    pub treatments: Vec<TreatmentRef>,
    pub photo: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: Option<String>,
    pub slug: Option<String>,
    pub slug_locked: bool,
    pub status: ApprovalStatus,
    pub is_active: bool,
    pub city: Option<String>,
    pub description: Option<String>,
    pub requirements: Vec<String>,
    pub employment_type: Option<String>,
    pub salary: Option<String>,
    pub company_logo: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Blog {
    pub id: String,
    pub title: String,
    pub slug: Option<String>,
    pub slug_locked: bool,
    pub status: PublishStatus,
    /// HTML markup produced by the editor.
    pub content: String,
    pub excerpt: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub cover_image: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Treatment {
    pub id: String,
    pub name: String,
    pub slug: Option<String>,
    pub status: ApprovalStatus,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Any content entity the pipeline can reason about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    Clinic(Clinic),
    Doctor(Doctor),
    Job(Job),
    Blog(Blog),
    Treatment(Treatment),
}

/// Identity, publication state, and slug state shared by every entity.
///
/// The slug and its lock are written once by the publishing workflow; the
/// pipeline only ever reads them.
pub trait Indexable {
    fn id(&self) -> &str;
    fn kind(&self) -> EntityType;
    /// Primary identity field: the name or title.
    fn display_name(&self) -> &str;
    fn slug(&self) -> Option<&str>;
    fn slug_locked(&self) -> bool;
    /// Approved, or published for blogs.
    fn is_live(&self) -> bool;
    fn updated_at(&self) -> Option<DateTime<Utc>>;

    /// Non-blank slug, if any.
    fn present_slug(&self) -> Option<&str> {
        self.slug().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Slug is present and locked, or present on a type without a lock.
    fn has_stable_slug(&self) -> bool {
        self.present_slug().is_some() && (self.slug_locked() || !self.kind().has_slug_lock())
    }
}

macro_rules! impl_indexable {
    ($ty:ty, $kind:expr, $name:ident, live = |$s:ident| $live:expr, locked = |$l:ident| $locked:expr) => {
        impl Indexable for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn kind(&self) -> EntityType {
                $kind
            }
            fn display_name(&self) -> &str {
                &self.$name
            }
            fn slug(&self) -> Option<&str> {
                self.slug.as_deref()
            }
            fn slug_locked(&self) -> bool {
                let $l = self;
                $locked
            }
            fn is_live(&self) -> bool {
                let $s = self;
                $live
            }
            fn updated_at(&self) -> Option<DateTime<Utc>> {
                self.updated_at
            }
        }
    };
}

impl_indexable!(Clinic, EntityType::Clinic, name,
    live = |c| c.status == ApprovalStatus::Approved, locked = |c| c.slug_locked);
impl_indexable!(Doctor, EntityType::Doctor, name,
    live = |d| d.status == ApprovalStatus::Approved, locked = |d| d.slug_locked);
impl_indexable!(Job, EntityType::Job, title,
    live = |j| j.status == ApprovalStatus::Approved, locked = |j| j.slug_locked);
impl_indexable!(Blog, EntityType::Blog, title,
    live = |b| b.status == PublishStatus::Published, locked = |b| b.slug_locked);
impl_indexable!(Treatment, EntityType::Treatment, name,
    live = |t| t.status == ApprovalStatus::Approved, locked = |_t| false);

impl Entity {
    fn inner(&self) -> &dyn Indexable {
        match self {
            Entity::Clinic(c) => c,
            Entity::Doctor(d) => d,
            Entity::Job(j) => j,
            Entity::Blog(b) => b,
            Entity::Treatment(t) => t,
        }
    }

    /// First image suitable for social previews.
    pub fn primary_image(&self) -> Option<&str> {
        match self {
            Entity::Clinic(c) => c.photos.first().map(String::as_str),
            Entity::Doctor(d) => d.photo.as_deref(),
            Entity::Job(j) => j.company_logo.as_deref(),
            Entity::Blog(b) => b.cover_image.as_deref(),
            Entity::Treatment(t) => t.image.as_deref(),
        }
        .filter(|s| !s.trim().is_empty())
    }
}

impl Indexable for Entity {
    fn id(&self) -> &str {
        self.inner().id()
    }
    fn kind(&self) -> EntityType {
        self.inner().kind()
    }
    fn display_name(&self) -> &str {
        self.inner().display_name()
    }
    fn slug(&self) -> Option<&str> {
        self.inner().slug()
    }
    fn slug_locked(&self) -> bool {
        self.inner().slug_locked()
    }
    fn is_live(&self) -> bool {
        self.inner().is_live()
    }
    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.inner().updated_at()
    }
}

/// Whether an optional text field holds anything besides whitespace.
pub fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Character count of an optional text field, trimmed.
pub fn text_len(field: &Option<String>) -> usize {
    field.as_deref().map(|s| s.trim().chars().count()).unwrap_or(0)
}
