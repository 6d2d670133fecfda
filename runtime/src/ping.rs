//! Search engine notification after a sitemap rewrite.
//!
//! Pings are fire-and-forget from the pipeline's point of view: `spawn`
//! detaches the work, and its outcome is reported through tracing and the
//! event log rather than to the caller.

use crate::audit::logger::{Event, EventLog};
use crate::config::SeoConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResult {
    pub engine: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResult {
    pub sitemap_url: String,
    pub results: Vec<EngineResult>,
}

impl PingResult {
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}

#[derive(Debug, Clone)]
struct Engine {
    name: &'static str,
    endpoint: String,
}

pub struct SearchEnginePinger {
    http: reqwest::Client,
    engines: Vec<Engine>,
    delay: Duration,
    timeout: Duration,
    events: Option<Arc<EventLog>>,
}

impl SearchEnginePinger {
    pub fn new(google_endpoint: impl Into<String>, bing_endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            engines: vec![
                Engine {
                    name: "google",
                    endpoint: google_endpoint.into(),
                },
                Engine {
                    name: "bing",
                    endpoint: bing_endpoint.into(),
                },
            ],
            delay: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
            events: None,
        }
    }

    pub fn from_config(config: &SeoConfig) -> Self {
        Self::new(&config.google_ping_url, &config.bing_ping_url)
            .with_delay(config.ping_delay)
            .with_timeout(config.ping_timeout)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_log(mut self, events: Arc<EventLog>) -> Self {
        self.events = Some(events);
        self
    }

    /// Wait for propagation, then ping every engine concurrently.
    ///
    /// Never fails; each engine's outcome is reported in the result.
    pub async fn ping(&self, sitemap_url: &str) -> PingResult {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let results = futures::future::join_all(
            self.engines
                .iter()
                .map(|engine| self.ping_engine(engine, sitemap_url)),
        )
        .await;

        let result = PingResult {
            sitemap_url: sitemap_url.to_string(),
            results,
        };
        if let Some(events) = &self.events {
            for r in &result.results {
                let status = if r.success { "ok" } else { "failed" };
                events.record(
                    Event::new("ping", status)
                        .duration_ms(r.duration_ms)
                        .detail(serde_json::json!({
                            "engine": r.engine,
                            "sitemapUrl": result.sitemap_url,
                            "status": r.status,
                            "error": r.error,
                        })),
                );
            }
        }
        result
    }

    async fn ping_engine(&self, engine: &Engine, sitemap_url: &str) -> EngineResult {
        let started = Instant::now();
        let mut result = EngineResult {
            engine: engine.name.to_string(),
            success: false,
            status: None,
            error: None,
            duration_ms: 0,
        };

        let url = match Url::parse_with_params(&engine.endpoint, &[("sitemap", sitemap_url)]) {
            Ok(url) => url,
            Err(e) => {
                result.error = Some(format!("invalid ping endpoint {}: {e}", engine.endpoint));
                warn!(engine = engine.name, error = ?result.error, "ping skipped");
                return result;
            }
        };

        match self.http.get(url).timeout(self.timeout).send().await {
            Ok(resp) => {
                let status = resp.status();
                result.status = Some(status.as_u16());
                result.success = status.is_success();
                if !result.success {
                    result.error = Some(format!("{} returned {status}", engine.name));
                }
            }
            Err(e) if e.is_timeout() => {
                result.error = Some(format!("timed out after {}ms", self.timeout.as_millis()));
            }
            Err(e) => result.error = Some(e.to_string()),
        }
        result.duration_ms = started.elapsed().as_millis() as u64;

        if result.success {
            info!(engine = engine.name, status = ?result.status, "search engine pinged");
        } else {
            warn!(engine = engine.name, error = ?result.error, "search engine ping failed");
        }
        result
    }

    /// Run `ping` as a detached task. The caller may drop the handle.
    pub fn spawn(self: Arc<Self>, sitemap_url: String) -> JoinHandle<PingResult> {
        tokio::spawn(async move { self.ping(&sitemap_url).await })
    }
}
