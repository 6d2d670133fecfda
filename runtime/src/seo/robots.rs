//! Robots directives: the per-page meta value and the site-wide robots.txt.

use crate::policy::{IndexingDecision, Priority};
use serde::{Deserialize, Serialize};

pub const INDEX_FOLLOW: &str = "index, follow";
pub const INDEX_NOFOLLOW: &str = "index, nofollow";
pub const NOINDEX_NOFOLLOW: &str = "noindex, nofollow";

/// Value for `<meta name="robots">` and the `X-Robots-Tag` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsMeta {
    pub content: String,
    pub noindex: bool,
    pub nofollow: bool,
}

impl RobotsMeta {
    fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            noindex: content.starts_with("noindex"),
            nofollow: content.ends_with("nofollow"),
        }
    }

    /// HTTP header pair for the render layer.
    pub fn header(&self) -> (&'static str, &str) {
        ("X-Robots-Tag", &self.content)
    }

    pub fn meta_tag(&self) -> String {
        format!(r#"<meta name="robots" content="{}">"#, self.content)
    }
}

/// Map an indexing decision to its robots directive. Pure.
pub fn robots_meta(decision: &IndexingDecision) -> RobotsMeta {
    if !decision.should_index {
        return RobotsMeta::new(NOINDEX_NOFOLLOW);
    }
    match decision.priority {
        Priority::High => RobotsMeta::new(INDEX_FOLLOW),
        Priority::Medium if !decision.warnings.is_empty() => RobotsMeta::new(INDEX_NOFOLLOW),
        Priority::Medium => RobotsMeta::new(INDEX_FOLLOW),
        Priority::Low => RobotsMeta::new(NOINDEX_NOFOLLOW),
    }
}

/// Render the site robots.txt: everything allowed except `disallow`, plus
/// the sitemap index location.
pub fn render_robots_txt(disallow: &[String], sitemap_url: &str) -> String {
    let mut out = String::from("User-agent: *\nAllow: /\n");
    for path in disallow {
        out.push_str(&format!("Disallow: {path}\n"));
    }
    out.push_str(&format!("\nSitemap: {sitemap_url}\n"));
    out
}

/// Parsed robots.txt rules.
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    pub allowed: Vec<String>,
    pub disallowed: Vec<String>,
    pub sitemaps: Vec<String>,
}

impl RobotsRules {
    /// Check if a path is allowed by the robots rules.
    pub fn is_allowed(&self, path: &str) -> bool {
        let longest = |patterns: &[String]| {
            patterns
                .iter()
                .filter(|p| path_matches(path, p))
                .map(String::len)
                .max()
        };

        match (longest(self.allowed.as_slice()), longest(self.disallowed.as_slice())) {
            // Longer match wins; ties go to allow
            (Some(allow), Some(disallow)) => allow >= disallow,
            (None, Some(_)) => false,
            _ => true,
        }
    }
}

/// Parse a robots.txt string for a specific user agent.
pub fn parse_robots(txt: &str, user_agent: &str) -> RobotsRules {
    let mut rules = RobotsRules::default();
    let mut in_matching_group = false;
    let ua_lower = user_agent.to_lowercase();

    for line in txt.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                let ua = value.to_lowercase();
                in_matching_group = ua == "*" || ua == ua_lower;
            }
            "allow" if in_matching_group && !value.is_empty() => {
                rules.allowed.push(value.to_string());
            }
            "disallow" if in_matching_group && !value.is_empty() => {
                rules.disallowed.push(value.to_string());
            }
            // Sitemap directives are global
            "sitemap" if !value.is_empty() => rules.sitemaps.push(value.to_string()),
            _ => {}
        }
    }

    rules
}

fn path_matches(path: &str, pattern: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix('*') {
        return path.starts_with(prefix);
    }
    if let Some(exact) = pattern.strip_suffix('$') {
        return path == exact;
    }
    path.starts_with(pattern)
}
