// src/crawl/classify.rs
// =============================================================================
// Small, pure helpers that answer questions about a single URL string.
//
// What lives here:
// - Is this link relative (no scheme, no host)?
// - What does it look like without its #fragment (and maybe ?query)?
// - Is it an archive, an image, a document, or a normal page?
// - How do we turn a relative href into an absolute URL?
//
// Nothing in this file touches the network or the ledger, so everything
// is easy to unit test.
// =============================================================================

use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

// What kind of resource a URL points at, judged by its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A regular page (HTML or unknown) that may contain links
    None,
    /// .zip, .tar, ... - never crawled, never indexed
    Archive,
    /// .png, .jpg, ... - never crawled, never indexed
    Image,
    /// .pdf, .docx, ... - indexed, but we never look for links inside
    Document,
}

// The extension lists used to categorize URLs.
//
// These come from the config file, so a site that serves e.g. `.PDF`
// can add it explicitly. Matching is case-sensitive on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionLists {
    pub archive: Vec<String>,
    pub image: Vec<String>,
    pub document: Vec<String>,
}

impl Default for ExtensionLists {
    fn default() -> Self {
        let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        Self {
            archive: owned(&[".zip", ".gz", ".tar", ".bz2", ".7z", ".rar"]),
            image: owned(&[
                ".gif", ".jpeg", ".jpg", ".mp3", ".mp4", ".png", ".svg", ".bmp", ".eps", ".ico",
            ]),
            document: owned(&[
                ".doc", ".docx", ".ppt", ".pptx", ".xls", ".xlsx", ".pdf", ".ps",
            ]),
        }
    }
}

impl ExtensionLists {
    // Categorizes a URL by exact suffix match on its fragment-free form.
    //
    // Archive wins over image, and image wins over document, if a URL
    // somehow matches more than one list.
    pub fn category_of(&self, url: &str) -> Category {
        let bare = strip_fragment(url);
        let ends_with_any = |list: &[String]| list.iter().any(|ext| bare.ends_with(ext.as_str()));

        if ends_with_any(&self.archive) {
            Category::Archive
        } else if ends_with_any(&self.image) {
            Category::Image
        } else if ends_with_any(&self.document) {
            Category::Document
        } else {
            Category::None
        }
    }

    // Archives and images are dropped everywhere: in the frontier and in the
    // final pass before indexing
    pub fn is_excluded(&self, url: &str) -> bool {
        matches!(self.category_of(url), Category::Archive | Category::Image)
    }
}

// True if the URL has neither a scheme nor a host
//
// Examples:
//   "/docs"                 -> true
//   "../about"              -> true
//   "https://example.com/"  -> false
//   "//cdn.example.com/app" -> false (has a host, just no scheme)
//   "mailto:me@example.com" -> false (has a scheme)
pub fn is_relative(url: &str) -> bool {
    match Url::parse(url) {
        Ok(_) => false,
        Err(ParseError::RelativeUrlWithoutBase) => !url.starts_with("//"),
        Err(_) => false,
    }
}

// Everything before the first '#'
pub fn strip_fragment(url: &str) -> &str {
    match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

// Produces the identity string we use for dedup and ledger keys.
//
// The fragment is always removed. The query string is removed too unless
// the site is configured to keep query parameters.
pub fn normalize(url: &str, keep_query_params: bool) -> String {
    let bare = strip_fragment(url);
    if keep_query_params {
        return bare.to_string();
    }
    match bare.find('?') {
        Some(idx) => bare[..idx].to_string(),
        None => bare.to_string(),
    }
}

// Resolves a link found on `base` into an absolute URL.
//
// Relative links are joined with the page URL the way a browser would.
// Anything else (absolute URLs, mailto:, //host links) is returned as-is;
// the admission filter decides later whether it is worth keeping.
pub fn resolve(base: &str, candidate: &str) -> Option<String> {
    if !is_relative(candidate) {
        return Some(candidate.to_string());
    }

    let base = Url::parse(base).ok()?;
    base.join(candidate).ok().map(|url| url.to_string())
}

// Extension of the last path segment, e.g. "pdf" for ".../report.pdf"
pub fn file_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.last()?;
    let (stem, ext) = last.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_string())
}
