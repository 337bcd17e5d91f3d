// src/main.rs
// =============================================================================
// Entry point of the site-frontier CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, written to stderr)
// 3. Build the fetcher, ledger and indexer once, and hand them to the crawler
// 4. Print a summary and exit with a meaningful code:
//      0 = everything was discovered and indexed
//      1 = some pages failed to fetch or index (they are retried next run)
//      2 = the run itself failed (bad config, ledger unavailable, ...)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod fetch;
mod index;
mod ledger;
mod orchestrator;
mod sitemap;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::Config;
use fetch::HttpFetcher;
use index::{HttpIndexer, Indexer, LogIndexer};
use ledger::{MemoryLedger, SledLedger, UrlLedger};
use orchestrator::{RunSummary, WebsiteCrawler};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins; otherwise info, or debug with --verbose
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Crawl {
            config,
            ledger,
            max_depth,
            discover_only,
            json,
        } => handle_crawl(config, ledger, max_depth, discover_only, json).await,
        Commands::Ledger {
            ledger,
            urls,
            keep_query_params,
        } => handle_ledger(ledger, &urls, keep_query_params).await,
    }
}

async fn handle_crawl(
    config_path: PathBuf,
    ledger_path: Option<PathBuf>,
    max_depth: Option<usize>,
    discover_only: bool,
    json: bool,
) -> Result<i32> {
    let mut config = Config::load(&config_path)?;
    if let Some(depth) = max_depth {
        config.website_crawler.max_depth = depth;
    }

    let timeout = Duration::from_secs(config.website_crawler.request_timeout_secs);

    let ledger: Arc<dyn UrlLedger> = match ledger_path.or(config.ledger.path.clone()) {
        Some(path) => Arc::new(
            SledLedger::open(&path)
                .with_context(|| format!("opening URL ledger {}", path.display()))?,
        ),
        None => {
            warn!("no ledger configured; visited URLs will not be remembered after this run");
            Arc::new(MemoryLedger::new())
        }
    };

    let indexer: Arc<dyn Indexer> = match &config.indexer.endpoint {
        Some(endpoint) => Arc::new(HttpIndexer::new(
            endpoint,
            config.indexer.api_key.clone(),
            timeout,
        )?),
        None => {
            if !discover_only {
                warn!("no indexer endpoint configured; URLs will only be logged");
            }
            Arc::new(LogIndexer)
        }
    };

    let fetcher = Arc::new(HttpFetcher::new(timeout)?);
    let crawler = WebsiteCrawler::new(config.website_crawler, fetcher, ledger, indexer)?;
    let summary = crawler.run(discover_only).await?;

    print_summary(&summary, json)?;

    if summary.crawl_failures > 0 || summary.index_failures > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

async fn handle_ledger(path: PathBuf, urls: &[String], keep_query_params: bool) -> Result<i32> {
    // Never creates a ledger; fails if a crawl currently holds this one
    let ledger = SledLedger::open_existing(&path)
        .with_context(|| format!("opening URL ledger {}", path.display()))?;

    println!("{:<60} {:<10} {:<27} {:<27}", "URL", "STATUS", "CREATED", "VISITED");
    println!("{}", "=".repeat(124));

    for url in urls {
        let url = crawl::classify::normalize(url, keep_query_params);
        match ledger.entry(&url).await? {
            Some(entry) => {
                let visited_at = entry
                    .visited_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<60} {:<10} {:<27} {:<27}",
                    url,
                    format!("{:?}", entry.status()),
                    entry.created_at.to_rfc3339(),
                    visited_at
                );
            }
            None => println!("{:<60} {:<10}", url, "(none)"),
        }
    }

    Ok(0)
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("📊 Summary:");
    println!("   🔎 Discovered: {}", summary.discovered);
    println!("   ⚠️  Failed to fetch: {}", summary.crawl_failures);
    println!("   ✅ Indexed: {}", summary.indexed);
    println!("   ❌ Failed to index: {}", summary.index_failures);
    if !summary.removed.is_empty() {
        println!("   🗑️  Removed stale documents: {}", summary.removed.len());
    }
    Ok(())
}
