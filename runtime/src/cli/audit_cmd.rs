//! `seo-pipeline audit <type> <id>...`: batch health audit.

use crate::audit::{OverallHealth, SeoHealth, Severity};
use crate::cli::output::{self, Styled};
use crate::cli::Context;
use crate::entity::EntityType;
use anyhow::Result;

pub async fn run(ctx: &Context, kind: EntityType, ids: &[String]) -> Result<()> {
    let targets: Vec<(EntityType, String)> = ids.iter().map(|id| (kind, id.clone())).collect();
    let results = ctx.auditor().audit_many(&targets).await;

    if ctx.output.json {
        output::print_json(&results);
        return Ok(());
    }

    let s = Styled::new();
    for health in &results {
        print_health(&s, health);
    }

    let critical = results
        .iter()
        .filter(|h| h.overall_health == OverallHealth::Critical)
        .count();
    let status = if critical == 0 { s.green("ok") } else { s.red("critical") };
    output::print_status(&s, &status, &format!("{} audited, {critical} critical", results.len()));
    Ok(())
}

fn print_health(s: &Styled, health: &SeoHealth) {
    output::print_section(
        s,
        &format!("{} {}", health.entity_type.label(), health.entity_id),
    );
    let symbol = match health.overall_health {
        OverallHealth::Healthy => s.ok_sym(),
        OverallHealth::Warning => s.warn_sym(),
        OverallHealth::Critical => s.fail_sym(),
    };
    output::print_check(symbol, "Score", &output::score_label(s, health.score));

    for issue in &health.issues {
        let symbol = match issue.severity {
            Severity::Critical => s.fail_sym(),
            Severity::Warning => s.warn_sym(),
            Severity::Info => s.info_sym(),
        };
        let label = serde_json::to_value(issue.issue_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        output::print_check(symbol, &label, &issue.message);
        if let Some(fix) = &issue.fix {
            output::print_detail(&s.dim(fix));
        }
    }
}
