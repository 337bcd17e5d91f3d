// src/ledger/mod.rs
// =============================================================================
// The URL ledger remembers every URL the crawler has ever seen.
//
// Each URL has one entry:
//   { url, visited, crawled, created_at, visited_at }
//
// - visited = true  -> some crawl has claimed (or finished) this page
// - crawled = true  -> the page was handed to the indexer successfully
//
// Why a ledger?
// - It survives between runs, so a second crawl skips pages it already saw
// - It is what stops the crawler from looping forever on cyclic sites
// - It is shared, so two crawls at once don't fetch the same page twice
//
// Submodules:
// - table: the in-memory map and the rules for updating entries
// - memory: a ledger that lives only as long as the process
// - store: a ledger persisted in a sled database, shared between runs
// =============================================================================

mod memory;
mod store;
mod table;

pub use memory::MemoryLedger;
pub use store::SledLedger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// One row of the ledger, looked up by its `url` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub url: String,
    pub visited: bool,
    pub crawled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visited_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    fn unvisited(url: &str) -> Self {
        LedgerEntry {
            url: url.to_string(),
            visited: false,
            crawled: false,
            created_at: Utc::now(),
            visited_at: None,
        }
    }

    // Sets both flags. `visited_at` is refreshed whenever visited = true;
    // `created_at` never changes.
    fn marked(mut self, visited: bool, crawled: bool) -> Self {
        self.visited = visited;
        self.crawled = crawled;
        if visited {
            self.visited_at = Some(Utc::now());
        }
        self
    }

    pub fn status(&self) -> UrlStatus {
        match (self.visited, self.crawled) {
            (false, _) => UrlStatus::Unseen,
            (true, false) => UrlStatus::Claimed,
            (true, true) => UrlStatus::Done,
        }
    }
}

// The three states a URL moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStatus {
    /// Never claimed, or a claim was retracted after a failed fetch
    Unseen,
    /// A crawl has claimed the URL but it is not indexed yet
    Claimed,
    /// Claimed and indexed
    Done,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("cannot open ledger at {path} (is another crawl holding it?): {source}")]
    Open {
        path: String,
        #[source]
        source: sled::Error,
    },
    #[error("no ledger at {path}")]
    Missing { path: String },
    #[error("ledger store error: {0}")]
    Store(#[from] sled::Error),
    #[error("corrupt ledger record for {url}: {source}")]
    Corrupt {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode ledger entry: {0}")]
    Encode(#[from] serde_json::Error),
}

// The operations the crawler needs from a ledger.
//
// Every method may fail. A failing ledger is fatal for the crawl: without it
// we can't tell which pages were already visited, and carrying on could
// expand the same pages over and over.
#[async_trait]
pub trait UrlLedger: Send + Sync {
    /// Sets both flags for a URL, creating the entry if needed
    async fn mark(&self, url: &str, visited: bool, crawled: bool) -> Result<(), LedgerError>;

    /// Sets `crawled = true` and leaves `visited` as stored, so a URL that
    /// was indexed without being expanded is still expanded by a later run
    async fn mark_crawled(&self, url: &str) -> Result<(), LedgerError>;

    /// True if an entry exists and has `visited = true`
    async fn is_visited(&self, url: &str) -> Result<bool, LedgerError>;

    async fn entry(&self, url: &str) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Atomic "if not visited, mark visited". Returns true if this call won
    /// the claim, false if the URL was already visited.
    async fn claim(&self, url: &str) -> Result<bool, LedgerError>;

    /// Records a newly discovered URL as unvisited if it has no entry yet.
    /// Returns true if the URL is already visited.
    async fn register(&self, url: &str) -> Result<bool, LedgerError>;

    async fn status(&self, url: &str) -> Result<UrlStatus, LedgerError> {
        Ok(self
            .entry(url)
            .await?
            .map(|e| e.status())
            .unwrap_or(UrlStatus::Unseen))
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is #[async_trait]?
//    - Trait methods can't easily return futures that live in a Box<dyn ..>
//    - The async-trait crate rewrites `async fn` into a boxed future for us,
//      which is what lets us store an `Arc<dyn UrlLedger>`
//
// 2. Why does `status` have a body inside the trait?
//    - It is a "provided method": implementors get it for free because it
//      only needs `entry`, which every ledger must implement
//
// 3. Why claim() instead of is_visited() followed by mark()?
//    - Between the check and the write, another crawl could claim the URL
//    - claim() does both in one step (a lock in memory, a compare-and-swap
//      in sled), so exactly one caller wins
// -----------------------------------------------------------------------------
