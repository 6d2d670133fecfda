//! `seo-pipeline run <type> <id>`: full pipeline for one entity.

use crate::cli::output::{self, OutputMode, Styled};
use crate::cli::Context;
use crate::entity::EntityType;
use crate::ping::PingResult;
use anyhow::Result;
use std::time::Duration;
use tokio::task::JoinHandle;

pub async fn run(ctx: &Context, kind: EntityType, id: &str, ping_wait: Duration) -> Result<()> {
    let run = ctx.pipeline().run(kind, id).await;
    let report = run.report;

    if !ctx.output.json {
        let s = Styled::new();
        output::print_section(&s, &format!("{} {id}", kind.label()));
        let symbol = if report.decision.should_index { s.ok_sym() } else { s.fail_sym() };
        output::print_check(symbol, "Index", &report.decision.reason);
        output::print_check(s.info_sym(), "Robots", &report.robots.content);
        if let Some(meta) = &report.meta {
            output::print_check(s.info_sym(), "Title", &meta.title);
        }
        if let Some(url) = &report.canonical_url {
            output::print_check(s.info_sym(), "Canonical", url);
        }
        if let Some(dup) = &report.duplicate_check {
            let symbol = if dup.is_duplicate { s.warn_sym() } else { s.ok_sym() };
            output::print_check(symbol, "Duplicates", &dup.reason);
        }
        if let Some(sitemap) = &report.sitemap {
            output::print_check(s.ok_sym(), "Sitemap", &format!("{} URLs", sitemap.total_urls));
        }
        for error in &report.errors {
            output::print_check(s.fail_sym(), "Error", error);
        }
        let status = if report.success { s.green("ok") } else { s.red("partial") };
        output::print_status(&s, &status, &format!("{}ms", report.duration_ms));
    } else {
        output::print_json(&report);
    }

    if let Some(handle) = run.ping {
        report_ping(handle, ping_wait, ctx.output).await;
    }
    Ok(())
}

/// Give the detached ping a bounded chance to finish before the process
/// exits. Its outcome is informational only.
pub async fn report_ping(handle: JoinHandle<PingResult>, wait: Duration, mode: OutputMode) {
    let result = match tokio::time::timeout(wait, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "ping task failed");
            return;
        }
        Err(_) => {
            tracing::warn!(wait_ms = wait.as_millis() as u64, "ping still running at exit");
            return;
        }
    };
    if mode.json || mode.quiet {
        return;
    }
    let s = Styled::new();
    for engine in &result.results {
        let symbol = if engine.success { s.ok_sym() } else { s.warn_sym() };
        let detail = engine.error.clone().unwrap_or_else(|| "pinged".to_string());
        output::print_check(symbol, &format!("Ping {}", engine.engine), &detail);
    }
}
