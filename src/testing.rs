// src/testing.rs
// =============================================================================
// Fakes used by the unit tests: a tiny in-memory web and an indexer that
// records what it was asked to do.
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::fetch::{FetchError, Page, PageFetcher};
use crate::index::{IndexError, IndexMetadata, IndexedDocument, Indexer};

// A fake web: URL -> (content, links). Unknown URLs answer 404.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, (String, Vec<String>)>,
    failing: HashSet<String>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        let links: Vec<String> = links.iter().map(|l| l.to_string()).collect();
        self.pages.insert(url.to_string(), (String::new(), links));
        self
    }

    pub fn document(mut self, url: &str, content: &str) -> Self {
        self.pages
            .insert(url.to_string(), (content.to_string(), Vec::new()));
        self
    }

    // Answers HTTP 500 for this URL
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Page, FetchError> {
        *self.fetches.lock().unwrap().entry(url.to_string()).or_default() += 1;

        if self.failing.contains(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: 500,
            });
        }
        match self.pages.get(url) {
            Some((content, links)) => Ok(Page {
                url: url.to_string(),
                content: content.clone(),
                links: links.clone(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

// Records indexed URLs; can be told to reject or error on specific ones
#[derive(Default)]
pub struct RecordingIndexer {
    rejects: HashSet<String>,
    errors: HashSet<String>,
    existing: Vec<IndexedDocument>,
    pub indexed: Mutex<Vec<(String, IndexMetadata)>>,
    pub deleted: Mutex<Vec<String>>,
}

impl RecordingIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(mut self, url: &str) -> Self {
        self.rejects.insert(url.to_string());
        self
    }

    pub fn erroring(mut self, url: &str) -> Self {
        self.errors.insert(url.to_string());
        self
    }

    pub fn with_existing(mut self, id: &str, url: Option<&str>) -> Self {
        self.existing.push(IndexedDocument {
            id: id.to_string(),
            url: url.map(str::to_string),
        });
        self
    }

    pub fn indexed_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self
            .indexed
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect();
        urls.sort();
        urls
    }
}

#[async_trait]
impl Indexer for RecordingIndexer {
    async fn index(&self, url: &str, metadata: &IndexMetadata) -> Result<bool, IndexError> {
        if self.errors.contains(url) {
            return Err(IndexError::Status {
                operation: "index",
                status: 503,
            });
        }
        if self.rejects.contains(url) {
            return Ok(false);
        }
        self.indexed
            .lock()
            .unwrap()
            .push((url.to_string(), metadata.clone()));
        Ok(true)
    }

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>, IndexError> {
        Ok(self.existing.clone())
    }

    async fn delete_document(&self, id: &str) -> Result<(), IndexError> {
        self.deleted.lock().unwrap().push(id.to_string());
        Ok(())
    }
}
