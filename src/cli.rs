// src/cli.rs
// =============================================================================
// Command-line interface, parsed with clap's derive API.
//
//   site-frontier crawl --config site.json [--ledger ledger.db]
//                       [--max-depth N] [--discover-only] [--json]
//   site-frontier ledger --ledger ledger.db <URL>...
// =============================================================================

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "site-frontier",
    version,
    about = "Crawl websites, remember what was visited, and index what was found",
    long_about = "site-frontier discovers pages from seed URLs (by crawling or from sitemaps), \
                  filters them with regex rules, keeps a durable ledger of visited URLs so \
                  repeated runs skip known pages, and sends the results to an indexing service."
)]
pub struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover pages for every seed URL and index them
    ///
    /// Example: site-frontier crawl --config site.json --ledger state/ledger.db
    Crawl {
        /// JSON config file
        #[arg(long, short)]
        config: PathBuf,

        /// Ledger directory; overrides `ledger.path` from the config
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Overrides `website_crawler.max_depth` from the config
        #[arg(long)]
        max_depth: Option<usize>,

        /// Stop after discovery (and the crawl report); index nothing
        #[arg(long)]
        discover_only: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what the ledger knows about some URLs
    ///
    /// Example: site-frontier ledger --ledger state/ledger.db https://example.com/
    Ledger {
        /// Ledger directory to read (must already exist)
        #[arg(long)]
        ledger: PathBuf,

        /// URLs to look up (matched exactly, after normalization)
        #[arg(required = true)]
        urls: Vec<String>,

        /// Keep query strings when normalizing the URLs
        #[arg(long)]
        keep_query_params: bool,
    },
}
