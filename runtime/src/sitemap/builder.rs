//! Sitemap generation.
//!
//! Every update rescans the store and rewrites every file wholesale: one
//! urlset per sitemap type, the index that references them, and robots.txt.
//! Cost grows with corpus size times the duplicate scan; there is no
//! incremental diff.

use crate::entity::{Entity, EntityStore, EntityType, Indexable, StatusFilter};
use crate::error::{Result, SeoError};
use crate::policy::{IndexingPolicy, Priority};
use crate::seo::{canonical_url, render_robots_txt};
use crate::sitemap::sink::SitemapSink;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const INDEX_FILE: &str = "sitemap.xml";
pub const ROBOTS_FILE: &str = "robots.txt";
const CHANGEFREQ: &str = "weekly";

/// Per-type sitemap file name, e.g. `sitemap-clinics.xml`.
pub fn sitemap_file(kind: EntityType) -> String {
    format!("sitemap-{}.xml", kind.plural())
}

/// One `<url>` element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapEntry {
    pub loc: String,
    /// `YYYY-MM-DD`.
    pub lastmod: String,
    pub changefreq: String,
    pub priority: f32,
}

fn sitemap_priority(priority: Priority) -> f32 {
    match priority {
        Priority::High => 0.9,
        Priority::Medium => 0.7,
        Priority::Low => 0.5,
    }
}

fn lastmod(updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    updated_at.unwrap_or(now).format("%Y-%m-%d").to_string()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapFile {
    pub name: String,
    pub url_count: usize,
}

/// Summary of one full rewrite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapUpdate {
    pub index_url: String,
    pub files: Vec<SitemapFile>,
    pub total_urls: usize,
    pub generated_at: DateTime<Utc>,
}

pub struct SitemapBuilder {
    store: Arc<dyn EntityStore>,
    policy: IndexingPolicy,
    base_url: String,
    sink: Arc<dyn SitemapSink>,
    robots_disallow: Vec<String>,
}

impl SitemapBuilder {
    pub fn new(
        store: Arc<dyn EntityStore>,
        policy: IndexingPolicy,
        base_url: impl Into<String>,
        sink: Arc<dyn SitemapSink>,
    ) -> Self {
        Self {
            store,
            policy,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sink,
            robots_disallow: Vec::new(),
        }
    }

    pub fn with_robots_disallow(mut self, paths: Vec<String>) -> Self {
        self.robots_disallow = paths;
        self
    }

    pub fn index_url(&self) -> String {
        format!("{}/{INDEX_FILE}", self.base_url)
    }

    /// Indexable entries of one type, in store order.
    ///
    /// The live corpus is fetched once and reused both as the candidate list
    /// and as the duplicate-detection corpus for every candidate. A duplicate
    /// scan that runs past the scan timeout fails the whole build, so a
    /// sitemap never lists an entity `decide` would refuse.
    pub async fn entries(&self, kind: EntityType) -> Result<Vec<SitemapEntry>> {
        let corpus: Arc<[Entity]> = self
            .store
            .find_many(kind, &StatusFilter::live())
            .await?
            .into();
        let filter = StatusFilter::sitemap(kind);
        let now = Utc::now();

        let mut entries = Vec::new();
        for entity in corpus.iter().filter(|e| filter.matches(e)) {
            let decision = self.policy.evaluate(entity, corpus.clone()).await?;
            if !decision.should_index {
                debug!(entity_type = %kind, entity_id = entity.id(), reason = %decision.reason, "excluded from sitemap");
                continue;
            }
            entries.push(self.entry(entity, decision.priority, now)?);
        }
        Ok(entries)
    }

    fn entry(&self, entity: &Entity, priority: Priority, now: DateTime<Utc>) -> Result<SitemapEntry> {
        let loc = canonical_url(entity, &self.base_url).ok_or_else(|| {
            SeoError::Canonical(format!("{} {} has no canonical URL", entity.kind(), entity.id()))
        })?;
        Ok(SitemapEntry {
            loc,
            lastmod: lastmod(entity.updated_at(), now),
            changefreq: CHANGEFREQ.to_string(),
            priority: sitemap_priority(priority),
        })
    }

    /// Rescan the store and rewrite every sitemap file, the index, and
    /// robots.txt.
    pub async fn update(&self) -> Result<SitemapUpdate> {
        let now = Utc::now();
        let mut files = Vec::new();
        let mut locs = Vec::new();

        for kind in EntityType::SITEMAP_TYPES {
            let entries = self.entries(kind).await?;
            let name = sitemap_file(kind);
            self.sink.write(&name, &render_urlset(&entries)?).await?;
            debug!(file = %name, urls = entries.len(), "sitemap written");
            locs.push(format!("{}/{name}", self.base_url));
            files.push(SitemapFile {
                name,
                url_count: entries.len(),
            });
        }

        let today = lastmod(None, now);
        self.sink
            .write(INDEX_FILE, &render_index(&locs, &today)?)
            .await?;
        self.sink
            .write(ROBOTS_FILE, &render_robots_txt(&self.robots_disallow, &self.index_url()))
            .await?;

        let total_urls = files.iter().map(|f| f.url_count).sum();
        info!(total_urls, files = files.len(), "sitemaps regenerated");
        Ok(SitemapUpdate {
            index_url: self.index_url(),
            files,
            total_urls,
            generated_at: now,
        })
    }
}

fn xml_err(e: impl std::fmt::Display) -> SeoError {
    SeoError::Xml(e.to_string())
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)?;
    Ok(())
}

/// Write `<root xmlns=...>`, the children produced by `body`, and `</root>`.
fn document(
    root: &str,
    body: impl FnOnce(&mut Writer<Vec<u8>>) -> Result<()>,
) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    let mut start = BytesStart::new(root);
    start.push_attribute(("xmlns", SITEMAP_NS));
    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    body(&mut writer)?;
    writer
        .write_event(Event::End(BytesEnd::new(root)))
        .map_err(xml_err)?;
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

/// Render a `<urlset>` document.
pub fn render_urlset(entries: &[SitemapEntry]) -> Result<String> {
    document("urlset", |w| {
        for entry in entries {
            w.write_event(Event::Start(BytesStart::new("url")))
                .map_err(xml_err)?;
            write_text_element(w, "loc", &entry.loc)?;
            write_text_element(w, "lastmod", &entry.lastmod)?;
            write_text_element(w, "changefreq", &entry.changefreq)?;
            write_text_element(w, "priority", &format!("{:.1}", entry.priority))?;
            w.write_event(Event::End(BytesEnd::new("url")))
                .map_err(xml_err)?;
        }
        Ok(())
    })
}

/// Render a `<sitemapindex>` document referencing `locs`.
pub fn render_index(locs: &[String], lastmod: &str) -> Result<String> {
    document("sitemapindex", |w| {
        for loc in locs {
            w.write_event(Event::Start(BytesStart::new("sitemap")))
                .map_err(xml_err)?;
            write_text_element(w, "loc", loc)?;
            write_text_element(w, "lastmod", lastmod)?;
            w.write_event(Event::End(BytesEnd::new("sitemap")))
                .map_err(xml_err)?;
        }
        Ok(())
    })
}

/// All `<loc>` values in a urlset or sitemap index document.
pub fn sitemap_locs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut locs = Vec::new();
    let mut in_loc = false;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.name().as_ref() == b"loc" => in_loc = true,
            Event::Text(e) if in_loc => locs.push(e.unescape().map_err(xml_err)?.into_owned()),
            Event::End(e) if e.name().as_ref() == b"loc" => in_loc = false,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(locs)
}
