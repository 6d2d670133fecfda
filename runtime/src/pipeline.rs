//! Per-entity orchestration of every SEO stage.
//!
//! Stage order is fixed:
//!
//! 1. indexing decision
//! 2. robots directive
//! 3. meta tags
//! 4. canonical URL
//! 5. duplicate check
//! 6. heading plan
//! 7. sitemap rewrite
//! 8. search engine ping (detached)
//!
//! Stages 1 and 2 always run and cannot fail. A non-indexable decision stops
//! the run after stage 2. Stages 3 to 7 are isolated from each other: a
//! failure is recorded in `errors` and the next stage still runs. The ping is
//! spawned and never awaited, so it cannot affect `success`.

use crate::audit::logger::{Event, EventLog};
use crate::config::SeoConfig;
use crate::entity::{Entity, EntityStore, EntityType, Indexable, StatusFilter};
use crate::error::{Result, SeoError};
use crate::ping::{PingResult, SearchEnginePinger};
use crate::policy::{DuplicateCheck, DuplicateDetector, IndexingDecision, IndexingPolicy};
use crate::seo::{
    canonical_url, compose_meta, plan_headings, robots_meta, HeadingPlan, MetaTags, RobotsMeta,
};
use crate::sitemap::{SitemapBuilder, SitemapSink, SitemapUpdate};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Everything one pipeline run produced. Partial results survive stage
/// failures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub run_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub success: bool,
    pub decision: IndexingDecision,
    pub robots: RobotsMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaTags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_check: Option<DuplicateCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headings: Option<HeadingPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sitemap: Option<SitemapUpdate>,
    pub ping_scheduled: bool,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// A finished run plus the handle of its detached ping, if one was sent.
/// Dropping the handle does not cancel the ping.
pub struct PipelineRun {
    pub report: PipelineReport,
    pub ping: Option<JoinHandle<PingResult>>,
}

pub struct Pipeline {
    store: Arc<dyn EntityStore>,
    policy: IndexingPolicy,
    sitemap: SitemapBuilder,
    pinger: Option<Arc<SearchEnginePinger>>,
    base_url: String,
    events: Option<Arc<EventLog>>,
}

/// Keep a stage's output, or record its failure under the stage label.
fn record<T>(errors: &mut Vec<String>, stage: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(stage, error = %e, "pipeline stage failed");
            errors.push(format!("{stage}: {e}"));
            None
        }
    }
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn EntityStore>,
        config: &SeoConfig,
        sink: Arc<dyn SitemapSink>,
        events: Option<Arc<EventLog>>,
    ) -> Self {
        let policy = IndexingPolicy::new(
            store.clone(),
            DuplicateDetector::new(config.duplicate_scan_timeout),
        );
        let sitemap = SitemapBuilder::new(store.clone(), policy.clone(), &config.base_url, sink)
            .with_robots_disallow(config.robots_disallow.clone());
        let pinger = config.ping_enabled.then(|| {
            let mut pinger = SearchEnginePinger::from_config(config);
            if let Some(events) = &events {
                pinger = pinger.with_event_log(events.clone());
            }
            Arc::new(pinger)
        });

        Self {
            store,
            policy,
            sitemap,
            pinger,
            base_url: config.base_url.clone(),
            events,
        }
    }

    pub fn policy(&self) -> &IndexingPolicy {
        &self.policy
    }

    pub fn sitemap(&self) -> &SitemapBuilder {
        &self.sitemap
    }

    /// Spawn a ping for the sitemap index, if pinging is enabled.
    pub fn schedule_ping(&self) -> Option<JoinHandle<PingResult>> {
        let pinger = self.pinger.clone()?;
        Some(pinger.spawn(self.sitemap.index_url()))
    }

    /// Run every stage for one entity.
    pub async fn run(&self, kind: EntityType, id: &str) -> PipelineRun {
        let started = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        info!(run_id = %run_id, entity_type = %kind, entity_id = id, "pipeline started");

        let decision = self.policy.decide(kind, id).await;
        let robots = robots_meta(&decision);

        let mut report = PipelineReport {
            run_id,
            entity_type: kind,
            entity_id: id.to_string(),
            success: true,
            robots,
            meta: None,
            canonical_url: None,
            duplicate_check: None,
            headings: None,
            sitemap: None,
            ping_scheduled: false,
            errors: Vec::new(),
            duration_ms: 0,
            decision,
        };

        let mut ping = None;
        if report.decision.should_index {
            ping = self.run_indexable_stages(kind, id, &mut report).await;
        } else {
            info!(run_id = %report.run_id, reason = %report.decision.reason, "not indexable, skipping remaining stages");
        }

        report.success = report.errors.is_empty();
        report.ping_scheduled = ping.is_some();
        report.duration_ms = started.elapsed().as_millis() as u64;
        self.log_run(&report);

        PipelineRun { report, ping }
    }

    async fn run_indexable_stages(
        &self,
        kind: EntityType,
        id: &str,
        report: &mut PipelineReport,
    ) -> Option<JoinHandle<PingResult>> {
        let errors = &mut report.errors;
        let loaded = match self.store.find_by_id(kind, id).await {
            Ok(Some(entity)) => Ok(entity),
            Ok(None) => Err(SeoError::NotFound {
                kind,
                id: id.to_string(),
            }),
            Err(e) => Err(e),
        };
        let entity = record(errors, "load", loaded);
        let entity = entity.as_ref();

        report.meta = record(errors, "meta", require(entity, kind, id).and_then(meta_stage));
        report.canonical_url = record(
            errors,
            "canonical",
            require(entity, kind, id).and_then(|e| canonical_stage(e, &self.base_url)),
        );
        report.duplicate_check = record(
            errors,
            "duplicate",
            match require(entity, kind, id) {
                Ok(e) => self.duplicate_stage(e).await,
                Err(e) => Err(e),
            },
        );
        report.headings = record(
            errors,
            "headings",
            require(entity, kind, id).and_then(heading_stage),
        );
        report.sitemap = record(errors, "sitemap", self.sitemap.update().await);

        // Only announce a sitemap that was actually rewritten.
        report.sitemap.as_ref()?;
        self.schedule_ping()
    }

    async fn duplicate_stage(&self, entity: &Entity) -> Result<DuplicateCheck> {
        let corpus = self
            .store
            .find_many(entity.kind(), &StatusFilter::live())
            .await?;
        self.policy
            .detector()
            .check_bounded(entity.clone(), corpus.into())
            .await
    }

    fn log_run(&self, report: &PipelineReport) {
        info!(
            run_id = %report.run_id,
            success = report.success,
            errors = report.errors.len(),
            ping_scheduled = report.ping_scheduled,
            duration_ms = report.duration_ms,
            "pipeline finished"
        );
        if let Some(events) = &self.events {
            let status = if report.success { "ok" } else { "partial" };
            events.record(
                Event::new("pipeline_run", status)
                    .run(&report.run_id)
                    .entity(&report.entity_type.to_string(), &report.entity_id)
                    .duration_ms(report.duration_ms)
                    .detail(serde_json::json!({
                        "shouldIndex": report.decision.should_index,
                        "reason": report.decision.reason,
                        "errors": report.errors,
                    })),
            );
        }
    }
}

fn require<'a>(entity: Option<&'a Entity>, kind: EntityType, id: &str) -> Result<&'a Entity> {
    entity.ok_or_else(|| SeoError::NotFound {
        kind,
        id: id.to_string(),
    })
}

fn meta_stage(entity: &Entity) -> Result<MetaTags> {
    let meta = compose_meta(entity);
    meta.ensure_valid()?;
    Ok(meta)
}

fn canonical_stage(entity: &Entity, base_url: &str) -> Result<String> {
    canonical_url(entity, base_url)
        .ok_or_else(|| SeoError::Canonical("entity has no stable slug".to_string()))
}

fn heading_stage(entity: &Entity) -> Result<HeadingPlan> {
    let plan = plan_headings(entity);
    plan.ensure_valid()?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ApprovalStatus, MemoryStore};
    use crate::sitemap::MemorySitemapSink;
    use crate::testing::{self, FailingSink, BASE_URL};
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> SeoConfig {
        SeoConfig {
            base_url: BASE_URL.to_string(),
            ping_enabled: false,
            event_log: None,
            ..SeoConfig::default()
        }
    }

    fn entities() -> Vec<Entity> {
        let mut pending = testing::clinic("c2", "Pune Eye Hospital");
        pending.status = ApprovalStatus::Pending;
        vec![
            Entity::Clinic(testing::clinic("c1", "Smile Dental")),
            Entity::Clinic(pending),
        ]
    }

    fn pipeline(config: &SeoConfig, sink: Arc<dyn SitemapSink>) -> Pipeline {
        let store = Arc::new(MemoryStore::with_entities(entities()));
        Pipeline::new(store, config, sink, None)
    }

    #[tokio::test]
    async fn test_indexable_entity_runs_every_stage() {
        let sink = Arc::new(MemorySitemapSink::new());
        let run = pipeline(&config(), sink.clone()).run(EntityType::Clinic, "c1").await;
        let report = run.report;

        assert!(report.success, "{:?}", report.errors);
        assert_eq!(report.robots.content, "index, follow");
        assert_eq!(report.meta.unwrap().title, "Smile Dental in Pune");
        assert_eq!(
            report.canonical_url.as_deref(),
            Some("https://example.com/clinics/smile-dental")
        );
        assert!(!report.duplicate_check.unwrap().is_duplicate);
        assert_eq!(report.headings.unwrap().h1, "Smile Dental");
        assert_eq!(report.sitemap.unwrap().total_urls, 1);
        assert!(sink.get("sitemap-clinics.xml").unwrap().contains("smile-dental"));
        assert!(!report.ping_scheduled);
        assert!(run.ping.is_none());
    }

    #[tokio::test]
    async fn test_non_indexable_short_circuits() {
        let sink = Arc::new(MemorySitemapSink::new());
        let report = pipeline(&config(), sink.clone())
            .run(EntityType::Clinic, "c2")
            .await
            .report;

        assert!(report.success);
        assert!(!report.decision.should_index);
        assert_eq!(report.robots.content, "noindex, nofollow");
        assert!(report.meta.is_none());
        assert!(report.sitemap.is_none());
        assert!(sink.names().is_empty());
    }

    #[tokio::test]
    async fn test_sitemap_failure_keeps_partial_results() {
        let report = pipeline(&config(), Arc::new(FailingSink))
            .run(EntityType::Clinic, "c1")
            .await
            .report;

        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("sitemap: "));
        assert!(report.meta.is_some());
        assert!(report.headings.is_some());
        assert!(!report.ping_scheduled);
    }

    #[tokio::test]
    async fn test_duplicate_scan_timeout_is_an_isolated_stage_error() {
        // Blog decisions never scan, so only the duplicate stage overruns.
        let filler = "Brushing and flossing every day keeps plaque away. ".repeat(12);
        let blogs: Vec<Entity> = (0..300)
            .map(|i| {
                let mut blog = testing::blog(&format!("b{i}"), &format!("Dental care guide part {i}"));
                blog.content = format!("<p>Part {i}</p>{filler}");
                Entity::Blog(blog)
            })
            .collect();
        let config = SeoConfig {
            duplicate_scan_timeout: Duration::from_millis(1),
            ..config()
        };
        let sink = Arc::new(MemorySitemapSink::new());
        let p = Pipeline::new(
            Arc::new(MemoryStore::with_entities(blogs)),
            &config,
            sink.clone(),
            None,
        );

        let report = p.run(EntityType::Blog, "b0").await.report;
        assert!(report.decision.should_index);
        assert!(!report.success);
        assert_eq!(
            report.errors,
            vec!["duplicate: duplicate scan timed out after 1ms".to_string()]
        );
        assert!(report.duplicate_check.is_none());
        assert!(report.meta.is_some());
        assert!(report.headings.is_some());
        assert_eq!(report.sitemap.unwrap().total_urls, 300);
        assert!(sink.get("sitemap-blogs.xml").is_some());
    }

    #[tokio::test]
    async fn test_ping_failure_never_affects_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let config = SeoConfig {
            ping_enabled: true,
            google_ping_url: format!("{}/google", server.uri()),
            bing_ping_url: format!("{}/bing", server.uri()),
            ping_delay: Duration::ZERO,
            ping_timeout: Duration::from_secs(2),
            ..config()
        };

        let run = pipeline(&config, Arc::new(MemorySitemapSink::new()))
            .run(EntityType::Clinic, "c1")
            .await;
        assert!(run.report.success);
        assert!(run.report.ping_scheduled);

        let ping = run.ping.unwrap().await.unwrap();
        assert!(!ping.all_succeeded());
        assert_eq!(ping.sitemap_url, "https://example.com/sitemap.xml");
    }

    #[tokio::test]
    async fn test_run_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let events = Arc::new(EventLog::open(&path).unwrap());
        let store = Arc::new(MemoryStore::with_entities(entities()));
        let p = Pipeline::new(store, &config(), Arc::new(MemorySitemapSink::new()), Some(events));

        let report = p.run(EntityType::Clinic, "c2").await.report;
        let line = std::fs::read_to_string(&path).unwrap();
        let event: Event = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(event.event, "pipeline_run");
        assert_eq!(event.run_id.as_deref(), Some(report.run_id.as_str()));
        assert_eq!(event.entity_type.as_deref(), Some("clinic"));
        assert_eq!(event.detail.unwrap()["shouldIndex"], false);
    }
}
