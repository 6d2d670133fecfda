//! Per-page SEO artifacts derived from an entity and its indexing decision.

pub mod canonical;
pub mod headings;
pub mod meta;
pub mod robots;

pub use canonical::{
    canonical_url, find_conflicts, is_canonical, resolve_canonical, CanonicalConflict,
    CanonicalResolution, ConflictKind,
};
pub use headings::{plan_headings, HeadingPlan, HeadingValidation};
pub use meta::{compose_meta, MetaProblem, MetaTags};
pub use robots::{parse_robots, render_robots_txt, robots_meta, RobotsMeta, RobotsRules};
