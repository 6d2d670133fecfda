//! Pipeline configuration loaded from `SEO_*` environment variables.

use crate::error::{Result, SeoError};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_GOOGLE_PING_URL: &str = "https://www.google.com/ping";
pub const DEFAULT_BING_PING_URL: &str = "https://www.bing.com/ping";

/// Runtime settings shared by every pipeline component.
#[derive(Debug, Clone)]
pub struct SeoConfig {
    /// Public site origin, e.g. `https://example.com`. No trailing slash.
    pub base_url: String,
    /// Directory the sitemap files are written to.
    pub sitemap_dir: PathBuf,
    pub google_ping_url: String,
    pub bing_ping_url: String,
    /// Wait before pinging so the new sitemap has propagated.
    pub ping_delay: Duration,
    /// Per-request timeout for ping calls.
    pub ping_timeout: Duration,
    /// Upper bound on a single duplicate-detection corpus scan.
    pub duplicate_scan_timeout: Duration,
    /// Maximum concurrent audits in batch mode.
    pub audit_concurrency: usize,
    pub ping_enabled: bool,
    /// JSONL event log path. `None` disables the log.
    pub event_log: Option<PathBuf>,
    /// Path prefixes disallowed in the generated robots.txt.
    pub robots_disallow: Vec<String>,
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            sitemap_dir: PathBuf::from("public"),
            google_ping_url: DEFAULT_GOOGLE_PING_URL.to_string(),
            bing_ping_url: DEFAULT_BING_PING_URL.to_string(),
            ping_delay: Duration::from_secs(2),
            ping_timeout: Duration::from_secs(10),
            duplicate_scan_timeout: Duration::from_secs(5),
            audit_concurrency: 8,
            ping_enabled: true,
            event_log: Some(default_event_log()),
            robots_disallow: vec!["/admin".into(), "/api/".into(), "/dashboard".into()],
        }
    }
}

impl SeoConfig {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("SEO_BASE_URL") {
            config.base_url = v;
        }
        if let Ok(v) = std::env::var("SEO_SITEMAP_DIR") {
            config.sitemap_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("SEO_GOOGLE_PING_URL") {
            config.google_ping_url = v;
        }
        if let Ok(v) = std::env::var("SEO_BING_PING_URL") {
            config.bing_ping_url = v;
        }
        if let Some(ms) = env_u64("SEO_PING_DELAY_MS")? {
            config.ping_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("SEO_PING_TIMEOUT_MS")? {
            config.ping_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = env_u64("SEO_DUPLICATE_TIMEOUT_MS")? {
            config.duplicate_scan_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = env_u64("SEO_AUDIT_CONCURRENCY")? {
            config.audit_concurrency = n as usize;
        }
        if let Ok(v) = std::env::var("SEO_PING_ENABLED") {
            config.ping_enabled = !matches!(v.to_lowercase().as_str(), "0" | "false" | "no");
        }
        match std::env::var("SEO_EVENT_LOG") {
            Ok(v) if v.is_empty() => config.event_log = None,
            Ok(v) => config.event_log = Some(PathBuf::from(v)),
            Err(_) => {}
        }

        if let Ok(v) = std::env::var("SEO_ROBOTS_DISALLOW") {
            config.robots_disallow = v
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| SeoError::Config(format!("invalid base URL '{}': {e}", self.base_url)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SeoError::Config(format!(
                "base URL must be http(s), got '{}'",
                url.scheme()
            )));
        }
        if let Some(bad) = self.robots_disallow.iter().find(|p| !p.starts_with('/')) {
            return Err(SeoError::Config(format!(
                "robots disallow path must start with '/', got '{bad}'"
            )));
        }
        if self.audit_concurrency == 0 {
            return Err(SeoError::Config(
                "audit concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Public URL of the sitemap index.
    pub fn sitemap_index_url(&self) -> String {
        format!("{}/sitemap.xml", self.base_url)
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| SeoError::Config(format!("{key}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn default_event_log() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".seo-pipeline")
        .join("events.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SeoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sitemap_index_url(), "http://localhost:3000/sitemap.xml");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = SeoConfig {
            base_url: "not a url".to_string(),
            ..SeoConfig::default()
        };
        assert!(matches!(config.validate(), Err(SeoError::Config(_))));

        let config = SeoConfig {
            base_url: "ftp://example.com".to_string(),
            ..SeoConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_relative_disallow_path() {
        let config = SeoConfig {
            robots_disallow: vec!["admin".to_string()],
            ..SeoConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let config = SeoConfig {
            audit_concurrency: 0,
            ..SeoConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
