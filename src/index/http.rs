// src/index/http.rs
// =============================================================================
// Indexer backed by an HTTP service.
//
// Endpoints (relative to the configured base URL):
//   POST   {endpoint}/documents        body: { "url": ..., "metadata": {...} }
//   GET    {endpoint}/documents        -> [ { "id": ..., "url": ... }, ... ]
//   DELETE {endpoint}/documents/{id}
//
// An optional API key is sent as a bearer token.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

use super::{IndexError, IndexMetadata, IndexedDocument, Indexer};

#[derive(Serialize)]
struct IndexRequest<'a> {
    url: &'a str,
    metadata: &'a IndexMetadata,
}

pub struct HttpIndexer {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpIndexer {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, IndexError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn documents_url(&self) -> String {
        format!("{}/documents", self.endpoint)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl Indexer for HttpIndexer {
    async fn index(&self, url: &str, metadata: &IndexMetadata) -> Result<bool, IndexError> {
        let request = self
            .client
            .post(self.documents_url())
            .json(&IndexRequest { url, metadata });
        let response = self.authorize(request).send().await?;

        // A rejected document is a normal "false", not an error
        Ok(response.status().is_success())
    }

    async fn list_documents(&self) -> Result<Vec<IndexedDocument>, IndexError> {
        let response = self.authorize(self.client.get(self.documents_url())).send().await?;
        if !response.status().is_success() {
            return Err(IndexError::Status {
                operation: "list documents",
                status: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }

    async fn delete_document(&self, id: &str) -> Result<(), IndexError> {
        let url = format!("{}/{}", self.documents_url(), id);
        let response = self.authorize(self.client.delete(url)).send().await?;
        if !response.status().is_success() {
            return Err(IndexError::Status {
                operation: "delete document",
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
