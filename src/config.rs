// src/config.rs
// =============================================================================
// Loads the crawl configuration from a JSON file.
//
// Example file:
//
//   {
//     "website_crawler": {
//       "urls": ["https://docs.example.com"],
//       "pages_source": "crawl",
//       "max_depth": 3,
//       "pos_regex": ["https://docs\\.example\\.com"],
//       "neg_regex": [".*/private"],
//       "workers": 4,
//       "num_per_second": 10,
//       "crawl_report": true
//     },
//     "indexer": { "endpoint": "https://index.example.com/v1" },
//     "ledger": { "path": "ledger.db" }
//   }
//
// Every field except `urls` has a default, so a minimal file only needs
// the seed URLs.
// =============================================================================

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crawl::{AdmissionFilter, AdmissionRules, ExtensionLists, PatternError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error("website_crawler.urls must list at least one seed URL")]
    NoSeeds,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub website_crawler: WebsiteCrawlerConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

// How seed URLs are turned into page lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagesSource {
    /// Read the site's sitemap.xml
    Sitemap,
    /// Follow links from the seed page
    #[default]
    Crawl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiteCrawlerConfig {
    pub urls: Vec<String>,
    pub pages_source: PagesSource,
    pub max_depth: usize,
    pub pos_regex: Vec<String>,
    pub neg_regex: Vec<String>,
    pub extensions: ExtensionLists,
    /// Number of indexing workers; 0 means one per CPU core
    pub workers: usize,
    /// Per-worker ceiling on index requests per second
    pub num_per_second: u32,
    pub keep_query_params: bool,
    pub crawl_report: bool,
    pub report_dir: PathBuf,
    pub remove_old_content: bool,
    /// Value of the `source` metadata field on every indexed document
    pub source: String,
    pub request_timeout_secs: u64,
}

impl Default for WebsiteCrawlerConfig {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            pages_source: PagesSource::Crawl,
            max_depth: 3,
            pos_regex: Vec::new(),
            neg_regex: Vec::new(),
            extensions: ExtensionLists::default(),
            workers: 1,
            num_per_second: 10,
            keep_query_params: false,
            crawl_report: false,
            report_dir: PathBuf::from("."),
            remove_old_content: false,
            source: "website".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl WebsiteCrawlerConfig {
    // Compiles the regex lists; a bad pattern is reported here, at startup
    pub fn admission_filter(&self) -> Result<AdmissionFilter, ConfigError> {
        let rules = AdmissionRules::compile(&self.pos_regex, &self.neg_regex)?;
        Ok(AdmissionFilter::new(rules, self.extensions.clone()))
    }

    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }

    // A rate of 0 would block forever, so it is raised to 1
    pub fn rate_per_second(&self) -> u32 {
        self.num_per_second.max(1)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Base URL of the indexing service; without it nothing is sent anywhere
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// sled database directory that keeps visited state between runs
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn from_json(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text, &path.display().to_string())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.website_crawler.urls.is_empty() {
            return Err(ConfigError::NoSeeds);
        }
        self.website_crawler.admission_filter()?;
        Ok(())
    }
}
