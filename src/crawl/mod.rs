// src/crawl/mod.rs
// =============================================================================
// This module discovers pages by following links.
//
// Submodules:
// - classify: pure URL helpers (relative?, category, normalize, resolve)
// - admission: regex + structural rules deciding which links to follow
// - frontier: the depth-first traversal backed by the URL ledger
// =============================================================================

pub mod classify;
mod admission;
mod frontier;

pub use admission::{AdmissionFilter, AdmissionRules, PatternError};
pub use classify::ExtensionLists;
pub use frontier::{CrawlFrontier, FetchFailure};
