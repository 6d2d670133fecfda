//! `seo-pipeline decide <type> <id>`: print the indexing decision and the
//! robots directive it maps to.

use crate::cli::output::{self, Styled};
use crate::cli::Context;
use crate::entity::EntityType;
use crate::seo::robots_meta;
use anyhow::Result;

pub async fn run(ctx: &Context, kind: EntityType, id: &str) -> Result<()> {
    let pipeline = ctx.pipeline();
    let decision = pipeline.policy().decide(kind, id).await;
    let robots = robots_meta(&decision);

    if ctx.output.json {
        output::print_json(&serde_json::json!({
            "entityType": kind,
            "entityId": id,
            "decision": decision,
            "robots": robots,
        }));
        return Ok(());
    }

    let s = Styled::new();
    output::print_section(&s, &format!("{} {id}", kind.label()));
    let symbol = if decision.should_index { s.ok_sym() } else { s.fail_sym() };
    output::print_check(symbol, "Index", &decision.reason);
    output::print_check(s.info_sym(), "Priority", &format!("{:?}", decision.priority).to_lowercase());
    output::print_check(s.info_sym(), "Robots", &robots.content);
    for warning in &decision.warnings {
        output::print_check(s.warn_sym(), "Warning", &warning.message);
    }
    Ok(())
}
