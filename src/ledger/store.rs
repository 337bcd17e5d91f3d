// src/ledger/store.rs
// =============================================================================
// A ledger persisted in a sled database (an embedded key-value store).
//
// Layout: key = URL bytes, value = the LedgerEntry as JSON.
//
// How updates work:
// 1. Read the current value for the URL
// 2. Work out the new entry (or decide nothing needs to change)
// 3. compare_and_swap the old bytes for the new ones
// 4. If another writer got there first, start again from step 1
//
// sled holds a lock on its directory while it is open, so a second process
// pointed at the same ledger fails to open instead of silently writing to a
// copy. Crawls inside one process share the ledger by cloning the handle.
// =============================================================================

use std::path::Path;

use async_trait::async_trait;
use sled::Db;
use tracing::{debug, info};

use super::{LedgerEntry, LedgerError, UrlLedger};

#[derive(Clone)]
pub struct SledLedger {
    db: Db,
}

// What a compare-and-swap loop saw and did
struct Swap {
    before: Option<LedgerEntry>,
    written: bool,
}

impl SledLedger {
    // Opens the ledger, creating it if the directory doesn't exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|source| LedgerError::Open {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), entries = db.len(), "opened URL ledger");
        Ok(Self { db })
    }

    // Opens a ledger that must already exist (used for inspection, so a
    // mistyped path doesn't leave an empty ledger behind)
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LedgerError::Missing {
                path: path.display().to_string(),
            });
        }
        Self::open(path)
    }

    fn decode(url: &str, raw: &[u8]) -> Result<LedgerEntry, LedgerError> {
        serde_json::from_slice(raw).map_err(|source| LedgerError::Corrupt {
            url: url.to_string(),
            source,
        })
    }

    fn read(&self, url: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        self.db
            .get(url)?
            .map(|raw| Self::decode(url, &raw))
            .transpose()
    }

    // Applies `next` to the stored entry until the swap goes through.
    // `next` returning None means "leave it as it is".
    fn swap<F>(&self, url: &str, mut next: F) -> Result<Swap, LedgerError>
    where
        F: FnMut(Option<&LedgerEntry>) -> Option<LedgerEntry>,
    {
        loop {
            let raw = self.db.get(url)?;
            let before = raw
                .as_deref()
                .map(|bytes| Self::decode(url, bytes))
                .transpose()?;

            let Some(updated) = next(before.as_ref()) else {
                return Ok(Swap {
                    before,
                    written: false,
                });
            };
            let encoded = serde_json::to_vec(&updated)?;

            match self.db.compare_and_swap(url, raw, Some(encoded))? {
                Ok(()) => {
                    self.db.flush()?;
                    return Ok(Swap {
                        before,
                        written: true,
                    });
                }
                Err(_) => debug!(%url, "ledger entry changed underneath us, retrying"),
            }
        }
    }
}

#[async_trait]
impl UrlLedger for SledLedger {
    async fn mark(&self, url: &str, visited: bool, crawled: bool) -> Result<(), LedgerError> {
        self.swap(url, |current| {
            let entry = current
                .cloned()
                .unwrap_or_else(|| LedgerEntry::unvisited(url));
            Some(entry.marked(visited, crawled))
        })?;
        Ok(())
    }

    async fn mark_crawled(&self, url: &str) -> Result<(), LedgerError> {
        self.swap(url, |current| {
            let mut entry = current
                .cloned()
                .unwrap_or_else(|| LedgerEntry::unvisited(url));
            entry.crawled = true;
            Some(entry)
        })?;
        Ok(())
    }

    async fn is_visited(&self, url: &str) -> Result<bool, LedgerError> {
        Ok(self.read(url)?.map(|e| e.visited).unwrap_or(false))
    }

    async fn entry(&self, url: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        self.read(url)
    }

    async fn claim(&self, url: &str) -> Result<bool, LedgerError> {
        let swap = self.swap(url, |current| match current {
            Some(entry) if entry.visited => None,
            Some(entry) => Some(entry.clone().marked(true, entry.crawled)),
            None => Some(LedgerEntry::unvisited(url).marked(true, false)),
        })?;
        Ok(swap.written)
    }

    async fn register(&self, url: &str) -> Result<bool, LedgerError> {
        let swap = self.swap(url, |current| match current {
            Some(_) => None,
            None => Some(LedgerEntry::unvisited(url)),
        })?;
        Ok(swap.before.map(|e| e.visited).unwrap_or(false))
    }
}
