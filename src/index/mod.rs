// src/index/mod.rs
// =============================================================================
// This module hands crawled URLs to the search indexer.
//
// The orchestrator only sees the `Indexer` trait. Two implementations ship:
// - HttpIndexer: talks JSON to an indexing service
// - LogIndexer: logs what it would index (used when no endpoint is set)
// =============================================================================

mod http;

pub use http::HttpIndexer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

// Extra fields stored next to each indexed document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub source: String,
    pub url: String,
}

// A document already present in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("indexer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("indexer answered HTTP {status} for {operation}")]
    Status { operation: &'static str, status: u16 },
}

#[async_trait]
pub trait Indexer: Send + Sync {
    /// Returns Ok(false) when the service refused the document
    async fn index(&self, url: &str, metadata: &IndexMetadata) -> Result<bool, IndexError>;

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>, IndexError>;

    async fn delete_document(&self, id: &str) -> Result<(), IndexError>;
}

// Dry-run indexer: accepts everything and writes nothing
#[derive(Debug, Default)]
pub struct LogIndexer;

#[async_trait]
impl Indexer for LogIndexer {
    async fn index(&self, url: &str, metadata: &IndexMetadata) -> Result<bool, IndexError> {
        info!(url, source = %metadata.source, "would index");
        Ok(true)
    }

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>, IndexError> {
        Ok(Vec::new())
    }

    async fn delete_document(&self, id: &str) -> Result<(), IndexError> {
        info!(id, "would delete document");
        Ok(())
    }
}
