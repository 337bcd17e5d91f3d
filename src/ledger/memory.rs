// src/ledger/memory.rs
// =============================================================================
// A ledger that forgets everything when the process exits.
//
// Used when no ledger file is configured, and in tests.
// =============================================================================

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::table::LedgerTable;
use super::{LedgerEntry, LedgerError, UrlLedger};

#[derive(Debug, Default)]
pub struct MemoryLedger {
    table: Mutex<LedgerTable>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UrlLedger for MemoryLedger {
    async fn mark(&self, url: &str, visited: bool, crawled: bool) -> Result<(), LedgerError> {
        self.table.lock().await.mark(url, visited, crawled);
        Ok(())
    }

    async fn mark_crawled(&self, url: &str) -> Result<(), LedgerError> {
        self.table.lock().await.mark_crawled(url);
        Ok(())
    }

    async fn is_visited(&self, url: &str) -> Result<bool, LedgerError> {
        Ok(self.table.lock().await.is_visited(url))
    }

    async fn entry(&self, url: &str) -> Result<Option<LedgerEntry>, LedgerError> {
        Ok(self.table.lock().await.get(url).cloned())
    }

    async fn claim(&self, url: &str) -> Result<bool, LedgerError> {
        Ok(self.table.lock().await.claim(url))
    }

    async fn register(&self, url: &str) -> Result<bool, LedgerError> {
        Ok(self.table.lock().await.register(url))
    }
}
