// src/orchestrator/pool.rs
// =============================================================================
// Sends URLs to the indexer with a fixed number of workers.
//
// - All workers pull from one shared queue, so a slow URL only holds up
//   the worker that got it
// - Each worker has its own token bucket (governor), so N workers at R/s
//   never exceed N*R index requests per second in total
// - A URL that fails to index is logged and counted; the worker moves on
// - A successfully indexed URL is marked `crawled` in the ledger; its
//   `visited` flag is left alone, so pages that were never expanded (depth
//   limit, failed fetch, sitemap) are still expanded by a later crawl
//
// Ledger errors are the one thing that stops the pool.
// =============================================================================

use std::iter::Enumerate;
use std::num::NonZeroU32;
use std::slice::Iter;

use futures::future::try_join_all;
use governor::{Quota, RateLimiter};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::index::{IndexMetadata, Indexer};
use crate::ledger::{LedgerError, UrlLedger};

type WorkQueue<'u> = Mutex<Enumerate<Iter<'u, String>>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub indexed: usize,
    pub failed: usize,
}

impl IndexStats {
    fn merge(self, other: IndexStats) -> IndexStats {
        IndexStats {
            indexed: self.indexed + other.indexed,
            failed: self.failed + other.failed,
        }
    }
}

pub struct IndexPool<'a> {
    indexer: &'a dyn Indexer,
    ledger: &'a dyn UrlLedger,
    workers: usize,
    rate: NonZeroU32,
    source: &'a str,
}

impl<'a> IndexPool<'a> {
    pub fn new(
        indexer: &'a dyn Indexer,
        ledger: &'a dyn UrlLedger,
        workers: usize,
        rate: NonZeroU32,
        source: &'a str,
    ) -> Self {
        Self {
            indexer,
            ledger,
            workers: workers.max(1),
            rate,
            source,
        }
    }

    pub async fn run(&self, urls: &[String]) -> Result<IndexStats, LedgerError> {
        if urls.is_empty() {
            return Ok(IndexStats::default());
        }

        let workers = self.workers.min(urls.len());
        info!(workers, rate = self.rate.get(), "indexing {} URLs", urls.len());

        let queue: WorkQueue<'_> = Mutex::new(urls.iter().enumerate());
        let results = try_join_all((0..workers).map(|id| self.worker(id, &queue, urls.len()))).await?;

        Ok(results.into_iter().fold(IndexStats::default(), IndexStats::merge))
    }

    async fn worker(
        &self,
        id: usize,
        queue: &WorkQueue<'_>,
        total: usize,
    ) -> Result<IndexStats, LedgerError> {
        let limiter = RateLimiter::direct(Quota::per_second(self.rate));
        let mut stats = IndexStats::default();

        loop {
            // Take the lock only long enough to grab the next URL
            let next = queue.lock().await.next();
            let Some((position, url)) = next else {
                break;
            };

            if position % 100 == 0 {
                info!("Indexing URL number {} out of {}", position + 1, total);
            }

            limiter.until_ready().await;

            let metadata = IndexMetadata {
                source: self.source.to_string(),
                url: url.clone(),
            };
            match self.indexer.index(url, &metadata).await {
                Ok(true) => {
                    self.ledger.mark_crawled(url).await?;
                    stats.indexed += 1;
                    info!(worker = id, %url, "indexed");
                }
                Ok(false) => {
                    stats.failed += 1;
                    warn!(worker = id, %url, "indexing failed");
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(worker = id, %url, error = %e, "error while indexing");
                }
            }
        }

        Ok(stats)
    }
}
