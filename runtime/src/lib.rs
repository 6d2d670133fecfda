//! SEO decision pipeline for healthcare listing pages.
//!
//! Decides whether a clinic, doctor, job, blog post, or treatment page
//! should be indexed, composes its head tags, keeps the XML sitemaps and
//! robots.txt current, and scores the page's overall SEO health.

pub mod audit;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod ping;
pub mod pipeline;
pub mod policy;
pub mod seo;
pub mod sitemap;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Result, SeoError};
