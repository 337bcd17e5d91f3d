// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: walks the link graph from one seed URL.
//
// How it works (depth-first, one page at a time):
// 1. Pop a task (url, depth_remaining) off the stack
// 2. Skip archives/images entirely
// 3. Claim the URL in the ledger; if someone already visited it, skip it
// 4. Documents (.pdf, ...) are kept but never opened for links
// 5. Fetch the page; on failure give the claim back and move on
// 6. Register every link on the page in the ledger as "seen"
// 7. Keep the links that pass the admission filter and are new this run
// 8. If there is depth left, push them so they are expanded next
//
// The stack replaces recursion: the children of a page are pushed in reverse
// order, so the first child (and everything below it) is finished before its
// next sibling starts. Any page reached by an earlier sibling is already in
// `visited`, so later siblings never explore it again.
//
// A URL reached at the depth limit is registered in the ledger and included
// in the result, but never fetched.
// =============================================================================

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::admission::AdmissionFilter;
use super::classify::{self, Category};
use crate::fetch::PageFetcher;
use crate::ledger::{LedgerError, UrlLedger};

// Every URL discovered by one traversal, ordered for stable output
pub type VisitedSet = BTreeSet<String>;

// One unit of work on the stack
#[derive(Debug, Clone, PartialEq, Eq)]
struct CrawlTask {
    url: String,
    depth_remaining: usize,
}

// A page whose fetch failed; its ledger claim has been retracted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Every URL claimed or admitted during the traversal
    pub visited: VisitedSet,
    /// Pages that were actually fetched and had their links examined
    pub expanded: Vec<String>,
    pub failures: Vec<FetchFailure>,
}

pub struct CrawlFrontier<'a> {
    fetcher: &'a dyn PageFetcher,
    ledger: &'a dyn UrlLedger,
    filter: &'a AdmissionFilter,
    keep_query_params: bool,
}

impl<'a> CrawlFrontier<'a> {
    pub fn new(
        fetcher: &'a dyn PageFetcher,
        ledger: &'a dyn UrlLedger,
        filter: &'a AdmissionFilter,
        keep_query_params: bool,
    ) -> Self {
        Self {
            fetcher,
            ledger,
            filter,
            keep_query_params,
        }
    }

    // Crawls from `seed` with a fresh visited set
    pub async fn crawl(&self, seed: &str, max_depth: usize) -> Result<CrawlOutcome, LedgerError> {
        let mut outcome = CrawlOutcome::default();
        self.crawl_into(seed, max_depth, &mut outcome).await?;
        Ok(outcome)
    }

    // Crawls from `seed`, adding to an outcome that may already hold URLs
    // from an earlier traversal.
    //
    // Only ledger errors are returned. A page that fails to fetch is recorded
    // in `outcome.failures` and the walk carries on.
    pub async fn crawl_into(
        &self,
        seed: &str,
        max_depth: usize,
        outcome: &mut CrawlOutcome,
    ) -> Result<(), LedgerError> {
        let mut stack = vec![CrawlTask {
            url: seed.to_string(),
            depth_remaining: max_depth,
        }];

        while let Some(task) = stack.pop() {
            let children = self.expand(task, outcome).await?;
            // Reverse so the first link on the page is popped first
            stack.extend(children.into_iter().rev());
        }

        Ok(())
    }

    // Processes one task and returns the child tasks to push
    async fn expand(
        &self,
        task: CrawlTask,
        outcome: &mut CrawlOutcome,
    ) -> Result<Vec<CrawlTask>, LedgerError> {
        let url = classify::normalize(&task.url, self.keep_query_params);
        let category = self.filter.extensions().category_of(&url);

        if matches!(category, Category::Archive | Category::Image) {
            return Ok(Vec::new());
        }

        if !self.ledger.claim(&url).await? {
            debug!(%url, "already visited, skipping");
            return Ok(Vec::new());
        }
        outcome.visited.insert(url.clone());

        if category == Category::Document {
            return Ok(Vec::new());
        }

        let page = match self.fetcher.fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                // Give the claim back so a later run retries this page
                self.ledger.mark(&url, false, false).await?;
                warn!(%url, error = %e, "failed to fetch page");
                outcome.failures.push(FetchFailure {
                    url,
                    error: e.to_string(),
                });
                return Ok(Vec::new());
            }
        };
        debug!(url = %page.url, links = page.links.len(), "expanding page");
        outcome.expanded.push(url.clone());

        let mut candidates = Vec::new();
        for link in &page.links {
            let Some(resolved) = classify::resolve(&url, link) else {
                continue;
            };
            let resolved = classify::normalize(&resolved, self.keep_query_params);
            if !self.ledger.register(&resolved).await? {
                candidates.push(resolved);
            }
        }

        let mut seen = HashSet::new();
        let admitted: Vec<String> = candidates
            .into_iter()
            .filter(|c| !outcome.visited.contains(c) && self.filter.admit(c))
            .filter(|c| seen.insert(c.clone()))
            .collect();

        if admitted.is_empty() {
            return Ok(Vec::new());
        }
        outcome.visited.extend(admitted.iter().cloned());
        info!("collected {} URLs so far", outcome.visited.len());

        if task.depth_remaining == 0 {
            return Ok(Vec::new());
        }

        Ok(admitted
            .into_iter()
            .map(|url| CrawlTask {
                url,
                depth_remaining: task.depth_remaining - 1,
            })
            .collect())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Vec as a stack instead of recursion?
//    - async fns can't call themselves without boxing the future
//    - A deep site could overflow the call stack; a Vec just grows
//    - push() + pop() on a Vec is last-in-first-out, which gives depth-first
//
// 2. Why `&'a dyn PageFetcher` and not a generic?
//    - The frontier is built once per run from trait objects held in Arc
//    - `&dyn Trait` lets tests pass a StaticFetcher and main pass HttpFetcher
//      without the frontier caring which one it got
//
// 3. What is `let Some(x) = ... else { continue };`?
//    - "let-else": bind x if the pattern matches, otherwise run the else
//      block, which must leave the current scope (continue/return/break)
// -----------------------------------------------------------------------------
