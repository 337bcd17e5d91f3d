// src/orchestrator/mod.rs
// =============================================================================
// Drives a whole website crawl from the config file to the indexer.
//
// Steps:
// 1. For every seed URL, list pages from its sitemap or crawl from it
// 2. Merge everything, drop what the admission filter rejects, dedupe
// 3. Optionally write urls_indexed.txt
// 4. Index every URL with a pool of rate-limited workers
// 5. Optionally delete indexed documents that are no longer on the site
//
// Submodules:
// - pool: the indexing workers
// - report: the .txt report files
// =============================================================================

mod pool;
mod report;

pub use pool::IndexPool;

use std::collections::{BTreeSet, HashSet};
use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{PagesSource, WebsiteCrawlerConfig};
use crate::crawl::classify;
use crate::crawl::{AdmissionFilter, CrawlFrontier, FetchFailure};
use crate::fetch::PageFetcher;
use crate::index::Indexer;
use crate::ledger::UrlLedger;
use crate::sitemap;

// What `discover` found
#[derive(Debug, Clone, Default, Serialize)]
pub struct Discovery {
    /// Admitted, deduplicated and sorted URLs from every seed
    pub urls: Vec<String>,
    /// Pages whose fetch failed while crawling (retried on the next run)
    pub crawl_failures: Vec<FetchFailure>,
}

// Everything a run did, printed at the end (or as JSON with --json)
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub crawl_failures: usize,
    pub indexed: usize,
    pub index_failures: usize,
    pub removed: Vec<String>,
}

pub struct WebsiteCrawler {
    settings: WebsiteCrawlerConfig,
    filter: AdmissionFilter,
    fetcher: Arc<dyn PageFetcher>,
    ledger: Arc<dyn UrlLedger>,
    indexer: Arc<dyn Indexer>,
}

impl WebsiteCrawler {
    pub fn new(
        settings: WebsiteCrawlerConfig,
        fetcher: Arc<dyn PageFetcher>,
        ledger: Arc<dyn UrlLedger>,
        indexer: Arc<dyn Indexer>,
    ) -> Result<Self> {
        let filter = settings
            .admission_filter()
            .context("compiling admission rules")?;
        Ok(Self {
            settings,
            filter,
            fetcher,
            ledger,
            indexer,
        })
    }

    // Finds every URL to index, without indexing anything
    pub async fn discover(&self) -> Result<Discovery> {
        let frontier = CrawlFrontier::new(
            self.fetcher.as_ref(),
            self.ledger.as_ref(),
            &self.filter,
            self.settings.keep_query_params,
        );

        let mut all_urls = Vec::new();
        let mut crawl_failures = Vec::new();

        for seed in &self.settings.urls {
            let urls: Vec<String> = match self.settings.pages_source {
                PagesSource::Sitemap => sitemap::urls_from_sitemap(self.fetcher.as_ref(), seed).await,
                PagesSource::Crawl => {
                    // Each seed gets its own visited set; the ledger is shared
                    let outcome = frontier
                        .crawl(seed, self.settings.max_depth)
                        .await
                        .with_context(|| format!("URL ledger failed while crawling {}", seed))?;
                    debug!(seed = %seed, expanded = outcome.expanded.len(), "crawl finished");
                    crawl_failures.extend(outcome.failures);
                    outcome
                        .visited
                        .iter()
                        .map(|u| classify::normalize(u, self.settings.keep_query_params))
                        .collect()
                }
            };
            info!("Found {} URLs on {}", urls.len(), seed);
            all_urls.extend(urls);
        }

        // Final pass: http only, no archives/images, regex rules, no duplicates
        let urls: BTreeSet<String> = all_urls
            .into_iter()
            .filter(|u| self.filter.admit(u))
            .collect();

        let file_types: BTreeSet<String> = urls
            .iter()
            .filter_map(|u| classify::file_extension(u))
            .collect();
        if !file_types.is_empty() {
            info!("Note: file types = {:?}", file_types);
        }

        Ok(Discovery {
            urls: urls.into_iter().collect(),
            crawl_failures,
        })
    }

    // Runs discovery, then (unless `discover_only`) indexing and cleanup
    pub async fn run(&self, discover_only: bool) -> Result<RunSummary> {
        let discovery = self.discover().await?;
        let urls = discovery.urls;

        if self.settings.crawl_report {
            let path =
                report::write_url_report(&self.settings.report_dir, report::INDEXED_REPORT, &urls)
                    .await?;
            info!(
                "Collected {} URLs to crawl and index. See {} for a full report.",
                urls.len(),
                path.display()
            );
        } else {
            info!("Collected {} URLs to crawl and index.", urls.len());
        }

        let mut summary = RunSummary {
            discovered: urls.len(),
            crawl_failures: discovery.crawl_failures.len(),
            ..Default::default()
        };
        if discover_only {
            return Ok(summary);
        }

        let rate = NonZeroU32::new(self.settings.rate_per_second()).unwrap_or(NonZeroU32::MIN);
        let pool = IndexPool::new(
            self.indexer.as_ref(),
            self.ledger.as_ref(),
            self.settings.worker_count(),
            rate,
            &self.settings.source,
        );
        let stats = pool
            .run(&urls)
            .await
            .context("URL ledger failed while recording indexed pages")?;
        summary.indexed = stats.indexed;
        summary.index_failures = stats.failed;

        if self.settings.remove_old_content {
            summary.removed = self.remove_stale_documents(&urls).await?;
        }

        Ok(summary)
    }

    // Deletes indexed documents whose URL is not in this crawl.
    // Documents without a URL are left alone.
    async fn remove_stale_documents(&self, urls: &[String]) -> Result<Vec<String>> {
        let current: HashSet<&str> = urls.iter().map(String::as_str).collect();
        let existing = self
            .indexer
            .list_documents()
            .await
            .context("listing indexed documents")?;

        let mut removed = Vec::new();
        for doc in existing {
            let Some(url) = doc.url else { continue };
            if current.contains(url.as_str()) {
                continue;
            }
            match self.indexer.delete_document(&doc.id).await {
                Ok(()) => removed.push(url),
                Err(e) => warn!(id = %doc.id, %url, error = %e, "failed to delete stale document"),
            }
        }
        removed.sort();
        info!(
            "Removing {} docs that are not included in the crawl but are in the corpus.",
            removed.len()
        );

        if self.settings.crawl_report {
            report::write_url_report(&self.settings.report_dir, report::REMOVED_REPORT, &removed)
                .await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MemoryLedger, UrlStatus};
    use crate::testing::{RecordingIndexer, StaticFetcher};

    fn settings(urls: &[&str]) -> WebsiteCrawlerConfig {
        WebsiteCrawlerConfig {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            num_per_second: 1000,
            ..Default::default()
        }
    }

    fn site() -> StaticFetcher {
        StaticFetcher::new()
            .page(
                "https://a.com/",
                &["/docs", "/blog?page=2#top", "/pic.png", "https://b.com/"],
            )
            .page("https://a.com/docs", &["/docs/deep", "/"])
            .page("https://a.com/docs/deep", &[])
            .page("https://a.com/blog", &[])
            .page("https://b.com/", &["https://b.com/other"])
            .page("https://b.com/other", &[])
    }

    #[tokio::test]
    async fn test_discover_merges_and_filters() {
        let mut cfg = settings(&["https://a.com/"]);
        cfg.pos_regex = vec![r"https://a\.com".to_string()];
        let ledger = Arc::new(MemoryLedger::new());
        let crawler = WebsiteCrawler::new(
            cfg,
            Arc::new(site()),
            ledger,
            Arc::new(RecordingIndexer::new()),
        )
        .unwrap();

        let discovery = crawler.discover().await.unwrap();

        assert_eq!(
            discovery.urls,
            vec![
                "https://a.com/",
                "https://a.com/blog",
                "https://a.com/docs",
                "https://a.com/docs/deep",
            ]
        );
        assert!(discovery.crawl_failures.is_empty());
    }

    #[tokio::test]
    async fn test_second_seed_sees_first_seeds_ledger() {
        // b.com is reached from a.com, so crawling b.com afterwards finds
        // it already visited
        let cfg = settings(&["https://a.com/", "https://b.com/"]);
        let fetcher = Arc::new(site());
        let crawler = WebsiteCrawler::new(
            cfg,
            fetcher.clone(),
            Arc::new(MemoryLedger::new()),
            Arc::new(RecordingIndexer::new()),
        )
        .unwrap();

        let discovery = crawler.discover().await.unwrap();

        assert!(discovery.urls.contains(&"https://b.com/other".to_string()));
        assert_eq!(fetcher.fetch_count("https://b.com/"), 1);
    }

    #[tokio::test]
    async fn test_sitemap_mode() {
        let fetcher = StaticFetcher::new().document(
            "https://a.com/sitemap.xml",
            "<urlset><url><loc>https://a.com/x</loc></url>\
             <url><loc>https://a.com/x</loc></url>\
             <url><loc>https://a.com/photo.jpg</loc></url></urlset>",
        );
        let mut cfg = settings(&["https://a.com"]);
        cfg.pages_source = PagesSource::Sitemap;
        let crawler = WebsiteCrawler::new(
            cfg,
            Arc::new(fetcher),
            Arc::new(MemoryLedger::new()),
            Arc::new(RecordingIndexer::new()),
        )
        .unwrap();

        let discovery = crawler.discover().await.unwrap();
        assert_eq!(discovery.urls, vec!["https://a.com/x"]);
    }

    #[tokio::test]
    async fn test_run_indexes_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = settings(&["https://a.com/"]);
        cfg.pos_regex = vec![r"https://a\.com".to_string()];
        cfg.crawl_report = true;
        cfg.report_dir = dir.path().to_path_buf();
        cfg.workers = 2;

        let ledger = Arc::new(MemoryLedger::new());
        let indexer = Arc::new(RecordingIndexer::new().rejecting("https://a.com/blog"));
        let crawler =
            WebsiteCrawler::new(cfg, Arc::new(site()), ledger.clone(), indexer.clone()).unwrap();

        let summary = crawler.run(false).await.unwrap();

        assert_eq!(summary.discovered, 4);
        assert_eq!(summary.indexed, 3);
        assert_eq!(summary.index_failures, 1);
        assert_eq!(ledger.status("https://a.com/docs").await.unwrap(), UrlStatus::Done);
        assert_eq!(ledger.status("https://a.com/blog").await.unwrap(), UrlStatus::Claimed);

        let report = std::fs::read_to_string(dir.path().join("urls_indexed.txt")).unwrap();
        assert_eq!(report.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_final_pass_applies_negative_rules() {
        let fetcher = StaticFetcher::new().document(
            "https://a.com/sitemap.xml",
            "<urlset><url><loc>https://a.com/x</loc></url>\
             <url><loc>https://a.com/private/y</loc></url>\
             <url><loc>https://b.com/z</loc></url></urlset>",
        );
        let mut cfg = settings(&["https://a.com"]);
        cfg.pages_source = PagesSource::Sitemap;
        cfg.pos_regex = vec![r"https://a\.com".to_string()];
        cfg.neg_regex = vec![r"https://a\.com/private".to_string()];
        let crawler = WebsiteCrawler::new(
            cfg,
            Arc::new(fetcher),
            Arc::new(MemoryLedger::new()),
            Arc::new(RecordingIndexer::new()),
        )
        .unwrap();

        let discovery = crawler.discover().await.unwrap();
        assert_eq!(discovery.urls, vec!["https://a.com/x"]);
    }

    #[tokio::test]
    async fn test_final_pass_can_drop_the_seed() {
        // The seed is crawled for links, but the final pass still rejects it
        let mut cfg = settings(&["https://a.com/"]);
        cfg.neg_regex = vec![r"https://a\.com/$".to_string()];
        let fetcher = Arc::new(site());
        let crawler = WebsiteCrawler::new(
            cfg,
            fetcher.clone(),
            Arc::new(MemoryLedger::new()),
            Arc::new(RecordingIndexer::new()),
        )
        .unwrap();

        let discovery = crawler.discover().await.unwrap();

        assert_eq!(fetcher.fetch_count("https://a.com/"), 1);
        assert!(!discovery.urls.contains(&"https://a.com/".to_string()));
        assert!(discovery.urls.contains(&"https://a.com/docs".to_string()));
    }

    #[tokio::test]
    async fn test_keep_query_params_reaches_the_ledger() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://a.com/", &["/blog?page=2#top"])
                .page("https://a.com/blog?page=2", &[]),
        );
        let mut cfg = settings(&["https://a.com/"]);
        cfg.keep_query_params = true;
        let ledger = Arc::new(MemoryLedger::new());
        let crawler = WebsiteCrawler::new(
            cfg,
            fetcher.clone(),
            ledger.clone(),
            Arc::new(RecordingIndexer::new()),
        )
        .unwrap();

        let discovery = crawler.discover().await.unwrap();

        assert_eq!(discovery.urls, vec!["https://a.com/", "https://a.com/blog?page=2"]);
        assert_eq!(fetcher.fetch_count("https://a.com/blog?page=2"), 1);
        assert_eq!(
            ledger.status("https://a.com/blog?page=2").await.unwrap(),
            UrlStatus::Claimed
        );
        assert!(ledger.entry("https://a.com/blog").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_page_is_retried_after_being_indexed() {
        let ledger = Arc::new(MemoryLedger::new());
        let indexer = Arc::new(RecordingIndexer::new());
        let broken = StaticFetcher::new()
            .page("https://a.com/", &["/bad"])
            .failing("https://a.com/bad");
        let first = WebsiteCrawler::new(
            settings(&["https://a.com/"]),
            Arc::new(broken),
            ledger.clone(),
            indexer.clone(),
        )
        .unwrap();

        let summary = first.run(false).await.unwrap();
        assert_eq!(summary.crawl_failures, 1);
        assert!(indexer.indexed_urls().contains(&"https://a.com/bad".to_string()));
        assert_eq!(ledger.status("https://a.com/bad").await.unwrap(), UrlStatus::Unseen);

        // The next run can claim and expand it
        let fixed = Arc::new(
            StaticFetcher::new()
                .page("https://a.com/bad", &["/bad/child"])
                .page("https://a.com/bad/child", &[]),
        );
        let second = WebsiteCrawler::new(
            settings(&["https://a.com/bad"]),
            fixed.clone(),
            ledger.clone(),
            indexer,
        )
        .unwrap();

        let discovery = second.discover().await.unwrap();
        assert_eq!(fixed.fetch_count("https://a.com/bad"), 1);
        assert!(discovery.urls.contains(&"https://a.com/bad/child".to_string()));
    }

    #[tokio::test]
    async fn test_depth_limited_page_is_expanded_by_a_later_run() {
        let ledger = Arc::new(MemoryLedger::new());
        let mut cfg = settings(&["https://a.com/"]);
        cfg.max_depth = 0;
        let first = WebsiteCrawler::new(
            cfg,
            Arc::new(StaticFetcher::new().page("https://a.com/", &["/edge"])),
            ledger.clone(),
            Arc::new(RecordingIndexer::new()),
        )
        .unwrap();

        let summary = first.run(false).await.unwrap();
        assert_eq!(summary.indexed, 2);
        let edge = ledger.entry("https://a.com/edge").await.unwrap().unwrap();
        assert!(edge.crawled);
        assert_eq!(edge.status(), UrlStatus::Unseen);

        let fetcher = Arc::new(
            StaticFetcher::new()
                .page("https://a.com/edge", &["/edge/next"])
                .page("https://a.com/edge/next", &[]),
        );
        let second = WebsiteCrawler::new(
            settings(&["https://a.com/edge"]),
            fetcher.clone(),
            ledger.clone(),
            Arc::new(RecordingIndexer::new()),
        )
        .unwrap();

        let discovery = second.discover().await.unwrap();
        assert_eq!(fetcher.fetch_count("https://a.com/edge"), 1);
        assert_eq!(
            discovery.urls,
            vec!["https://a.com/edge", "https://a.com/edge/next"]
        );
    }

    #[tokio::test]
    async fn test_discover_only_indexes_nothing() {
        let indexer = Arc::new(RecordingIndexer::new());
        let crawler = WebsiteCrawler::new(
            settings(&["https://a.com/"]),
            Arc::new(site()),
            Arc::new(MemoryLedger::new()),
            indexer.clone(),
        )
        .unwrap();

        let summary = crawler.run(true).await.unwrap();

        assert!(summary.discovered > 0);
        assert!(indexer.indexed_urls().is_empty());
    }

    #[tokio::test]
    async fn test_stale_documents_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = settings(&["https://a.com/"]);
        cfg.max_depth = 0;
        cfg.remove_old_content = true;
        cfg.crawl_report = true;
        cfg.report_dir = dir.path().to_path_buf();

        let indexer = Arc::new(
            RecordingIndexer::new()
                .with_existing("1", Some("https://a.com/"))
                .with_existing("2", Some("https://a.com/gone"))
                .with_existing("3", None),
        );
        let crawler = WebsiteCrawler::new(
            cfg,
            Arc::new(site()),
            Arc::new(MemoryLedger::new()),
            indexer.clone(),
        )
        .unwrap();

        let summary = crawler.run(false).await.unwrap();

        assert_eq!(summary.removed, vec!["https://a.com/gone"]);
        assert_eq!(*indexer.deleted.lock().unwrap(), vec!["2".to_string()]);
        let report = std::fs::read_to_string(dir.path().join("urls_removed.txt")).unwrap();
        assert_eq!(report, "https://a.com/gone\n");
    }
}
