use anyhow::Result;
use clap::{Parser, Subcommand};
use seo_pipeline::cli::{self, Context, GlobalArgs};
use seo_pipeline::entity::EntityType;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "seo-pipeline", version, about = "SEO decisions for listing pages")]
struct Cli {
    /// JSON file holding the entity corpus (falls back to SEO_STORE)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Public site origin used for canonicals and sitemaps
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory sitemap files and robots.txt are written to
    #[arg(long, global = true)]
    sitemap_dir: Option<PathBuf>,

    /// Print machine-readable JSON to stdout
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Skip search engine pings
    #[arg(long, global = true)]
    no_ping: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the indexing decision for one entity
    Decide {
        #[arg(value_parser = parse_kind)]
        kind: EntityType,
        id: String,
    },
    /// Score the SEO health of one or more entities
    Audit {
        #[arg(value_parser = parse_kind)]
        kind: EntityType,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Run the full pipeline for an entity after it changed
    Run {
        #[arg(value_parser = parse_kind)]
        kind: EntityType,
        id: String,
        /// Seconds to wait for the search engine ping before exiting
        #[arg(long, default_value_t = 15)]
        ping_wait_secs: u64,
    },
    /// Regenerate every sitemap and robots.txt
    Sitemap {
        #[arg(long, default_value_t = 15)]
        ping_wait_secs: u64,
    },
}

fn parse_kind(s: &str) -> std::result::Result<EntityType, String> {
    s.parse()
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("seo_pipeline=info".parse()?);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_json)?;

    let ctx = Context::load(&GlobalArgs {
        store: cli.store,
        base_url: cli.base_url,
        sitemap_dir: cli.sitemap_dir,
        no_ping: cli.no_ping,
        json: cli.json,
        quiet: cli.quiet,
    })?;

    match cli.command {
        Command::Decide { kind, id } => cli::decide_cmd::run(&ctx, kind, &id).await,
        Command::Audit { kind, ids } => cli::audit_cmd::run(&ctx, kind, &ids).await,
        Command::Run {
            kind,
            id,
            ping_wait_secs,
        } => cli::run_cmd::run(&ctx, kind, &id, Duration::from_secs(ping_wait_secs)).await,
        Command::Sitemap { ping_wait_secs } => {
            cli::sitemap_cmd::run(&ctx, Duration::from_secs(ping_wait_secs)).await
        }
    }
}
