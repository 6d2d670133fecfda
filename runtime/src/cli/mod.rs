//! CLI subcommand implementations for the seo-pipeline binary.

pub mod audit_cmd;
pub mod decide_cmd;
pub mod output;
pub mod run_cmd;
pub mod sitemap_cmd;

use crate::audit::{EventLog, HealthAuditor};
use crate::cli::output::OutputMode;
use crate::config::SeoConfig;
use crate::entity::{EntityStore, MemoryStore};
use crate::pipeline::Pipeline;
use crate::seo::{parse_robots, RobotsRules};
use crate::sitemap::{FileSitemapSink, ROBOTS_FILE};
use anyhow::{Context as _, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub store: Option<PathBuf>,
    pub base_url: Option<String>,
    pub sitemap_dir: Option<PathBuf>,
    pub no_ping: bool,
    pub json: bool,
    pub quiet: bool,
}

/// Configuration, store, and event log resolved from flags and environment.
pub struct Context {
    pub config: SeoConfig,
    pub store: Arc<dyn EntityStore>,
    pub events: Option<Arc<EventLog>>,
    pub output: OutputMode,
}

impl Context {
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        let config = SeoConfig::from_env().context("invalid SEO_* environment")?;
        Self::with_config(config, args)
    }

    /// Apply flag overrides to `config`, then open the store and event log.
    pub fn with_config(mut config: SeoConfig, args: &GlobalArgs) -> Result<Self> {
        if let Some(url) = &args.base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(dir) = &args.sitemap_dir {
            config.sitemap_dir = dir.clone();
        }
        if args.no_ping {
            config.ping_enabled = false;
        }
        config.validate().context("invalid configuration")?;

        let store_path = args
            .store
            .clone()
            .or_else(|| std::env::var("SEO_STORE").ok().map(PathBuf::from))
            .context("no entity store given; pass --store FILE or set SEO_STORE")?;
        let store = MemoryStore::from_file(&store_path)
            .with_context(|| format!("failed to load store {}", store_path.display()))?;

        let events = match &config.event_log {
            Some(path) => match EventLog::open(path) {
                Ok(log) => Some(Arc::new(log)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "event log disabled");
                    None
                }
            },
            None => None,
        };

        Ok(Self {
            config,
            store: Arc::new(store),
            events,
            output: OutputMode {
                json: args.json,
                quiet: args.quiet,
            },
        })
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(
            self.store.clone(),
            &self.config,
            Arc::new(FileSitemapSink::new(&self.config.sitemap_dir)),
            self.events.clone(),
        )
    }

    pub fn auditor(&self) -> HealthAuditor {
        let pipeline = self.pipeline();
        let mut auditor = HealthAuditor::new(
            self.store.clone(),
            pipeline.policy().clone(),
            &self.config.base_url,
        )
        .with_concurrency(self.config.audit_concurrency);
        if let Some(rules) = self.robots_rules() {
            auditor = auditor.with_robots_rules(rules);
        }
        auditor
    }

    /// Rules from a previously generated robots.txt, if one exists.
    fn robots_rules(&self) -> Option<RobotsRules> {
        let path = self.config.sitemap_dir.join(ROBOTS_FILE);
        let txt = std::fs::read_to_string(path).ok()?;
        Some(parse_robots(&txt, "*"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityType;
    use crate::testing::{self, BASE_URL};

    #[tokio::test]
    async fn test_flags_override_config_and_select_output() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("entities.json");
        let body = serde_json::json!({ "clinics": [testing::clinic("c1", "Smile Dental")] });
        std::fs::write(&store, body.to_string()).unwrap();

        let config = SeoConfig {
            event_log: None,
            ..SeoConfig::default()
        };
        let args = GlobalArgs {
            store: Some(store),
            base_url: Some(format!("{BASE_URL}/")),
            sitemap_dir: Some(dir.path().join("public")),
            no_ping: true,
            json: true,
            quiet: true,
        };
        let ctx = Context::with_config(config, &args).unwrap();

        assert_eq!(ctx.output, OutputMode { json: true, quiet: true });
        assert_eq!(ctx.config.base_url, BASE_URL);
        assert!(!ctx.config.ping_enabled);
        assert!(ctx.events.is_none());
        assert!(ctx.store.find_by_id(EntityType::Clinic, "c1").await.unwrap().is_some());
        assert!(ctx.pipeline().schedule_ping().is_none());
    }
}
