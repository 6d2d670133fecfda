//! `seo-pipeline sitemap`: rebuild every sitemap file and robots.txt.

use crate::cli::output::{self, Styled};
use crate::cli::run_cmd::report_ping;
use crate::cli::Context;
use anyhow::{Context as _, Result};
use std::time::Duration;

pub async fn run(ctx: &Context, ping_wait: Duration) -> Result<()> {
    let pipeline = ctx.pipeline();
    let update = pipeline
        .sitemap()
        .update()
        .await
        .with_context(|| format!("failed to write sitemaps to {}", ctx.config.sitemap_dir.display()))?;

    if ctx.output.json {
        output::print_json(&update);
    } else {
        let s = Styled::new();
        output::print_section(&s, "Sitemaps");
        for file in &update.files {
            output::print_check(s.ok_sym(), &file.name, &format!("{} URLs", file.url_count));
        }
        output::print_status(
            &s,
            &s.green("ok"),
            &format!("{} URLs, index at {}", update.total_urls, update.index_url),
        );
    }

    if let Some(handle) = pipeline.schedule_ping() {
        report_ping(handle, ping_wait, ctx.output).await;
    }
    Ok(())
}
