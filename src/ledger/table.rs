// src/ledger/table.rs
// =============================================================================
// The in-memory table behind MemoryLedger.
//
// The rules for changing an entry live on LedgerEntry itself, so this table
// and the sled store update entries the same way.
// =============================================================================

use std::collections::HashMap;

use super::LedgerEntry;

#[derive(Debug, Default)]
pub(crate) struct LedgerTable {
    entries: HashMap<String, LedgerEntry>,
}

impl LedgerTable {
    pub(crate) fn get(&self, url: &str) -> Option<&LedgerEntry> {
        self.entries.get(url)
    }

    pub(crate) fn is_visited(&self, url: &str) -> bool {
        self.entries.get(url).map(|e| e.visited).unwrap_or(false)
    }

    // Updates an existing entry or creates a new one
    pub(crate) fn mark(&mut self, url: &str, visited: bool, crawled: bool) {
        let entry = self
            .entries
            .remove(url)
            .unwrap_or_else(|| LedgerEntry::unvisited(url))
            .marked(visited, crawled);
        self.entries.insert(url.to_string(), entry);
    }

    pub(crate) fn mark_crawled(&mut self, url: &str) {
        self.entries
            .entry(url.to_string())
            .or_insert_with(|| LedgerEntry::unvisited(url))
            .crawled = true;
    }

    // True when the claim succeeded, false when already visited
    pub(crate) fn claim(&mut self, url: &str) -> bool {
        if self.is_visited(url) {
            return false;
        }
        let crawled = self.entries.get(url).map(|e| e.crawled).unwrap_or(false);
        self.mark(url, true, crawled);
        true
    }

    // Inserts an unvisited entry if the URL is new; returns whether it was
    // already visited
    pub(crate) fn register(&mut self, url: &str) -> bool {
        match self.entries.get(url) {
            Some(existing) => existing.visited,
            None => {
                self.entries
                    .insert(url.to_string(), LedgerEntry::unvisited(url));
                false
            }
        }
    }
}
