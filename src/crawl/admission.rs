// src/crawl/admission.rs
// =============================================================================
// Decides whether a discovered URL is allowed into the crawl.
//
// A URL is admitted when ALL of these hold:
// 1. It starts with "http" (so http:// or https://)
// 2. It is not an archive or an image (documents are fine)
// 3. It matches at least one positive pattern (or there are none)
// 4. It matches no negative pattern (or there are none)
//
// Patterns are matched at the START of the URL only, not against the whole
// string: "^https://a\.com" and "https://a\.com" behave the same, and
// "/private" only matches URLs that literally begin with "/private".
// =============================================================================

use regex::Regex;
use thiserror::Error;

use super::classify::ExtensionLists;

#[derive(Debug, Error)]
#[error("invalid admission pattern '{pattern}': {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

// One compiled pattern, anchored at the start of the input
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let invalid = |source: regex::Error| PatternError {
            pattern: pattern.to_string(),
            source,
        };
        // Check the pattern on its own first: wrapping can balance stray
        // parentheses, e.g. "a)(b" becomes the valid "^(?:a)(b)"
        Regex::new(pattern).map_err(invalid)?;
        // Wrapping in ^(?:...) turns a search into a prefix match
        Regex::new(&format!("^(?:{})", pattern))
            .map(Self)
            .map_err(invalid)
    }

    pub fn matches(&self, url: &str) -> bool {
        self.0.is_match(url)
    }
}

// The positive/negative pattern lists from the config file
#[derive(Debug, Clone, Default)]
pub struct AdmissionRules {
    pub positive: Vec<Pattern>,
    pub negative: Vec<Pattern>,
}

impl AdmissionRules {
    // Compiles every pattern up front, so a typo in the config stops the
    // program before any page is fetched
    pub fn compile(positive: &[String], negative: &[String]) -> Result<Self, PatternError> {
        let compile_all = |list: &[String]| -> Result<Vec<Pattern>, PatternError> {
            list.iter().map(|p| Pattern::new(p)).collect()
        };
        Ok(Self {
            positive: compile_all(positive)?,
            negative: compile_all(negative)?,
        })
    }

    pub fn matches(&self, url: &str) -> bool {
        let positive_ok = self.positive.is_empty() || self.positive.iter().any(|p| p.matches(url));
        let negative_ok = self.negative.is_empty() || !self.negative.iter().any(|p| p.matches(url));
        positive_ok && negative_ok
    }
}

// Regex rules plus the structural rules (scheme, extension category)
#[derive(Debug, Clone, Default)]
pub struct AdmissionFilter {
    rules: AdmissionRules,
    extensions: ExtensionLists,
}

impl AdmissionFilter {
    pub fn new(rules: AdmissionRules, extensions: ExtensionLists) -> Self {
        Self { rules, extensions }
    }

    pub fn extensions(&self) -> &ExtensionLists {
        &self.extensions
    }

    pub fn admit(&self, url: &str) -> bool {
        url.starts_with("http") && !self.extensions.is_excluded(url) && self.rules.matches(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(positive: &[&str], negative: &[&str]) -> AdmissionFilter {
        let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        let rules = AdmissionRules::compile(&owned(positive), &owned(negative)).unwrap();
        AdmissionFilter::new(rules, ExtensionLists::default())
    }

    #[test]
    fn test_positive_and_negative_rules() {
        let f = filter(&[r"^https://a\.com"], &["/private"]);
        assert!(f.admit("https://a.com/x"));
        assert!(!f.admit("https://b.com/x"));
    }

    #[test]
    fn test_negative_pattern_is_prefix_match() {
        // "/private" can only match at position 0, so it needs a broader
        // pattern to reject paths in the middle of the URL
        let prefix_only = filter(&[r"^https://a\.com"], &["/private"]);
        assert!(prefix_only.admit("https://a.com/private/y"));

        let anywhere = filter(&[r"^https://a\.com"], &[".*/private"]);
        assert!(!anywhere.admit("https://a.com/private/y"));
        assert!(anywhere.admit("https://a.com/x"));
    }

    #[test]
    fn test_prefix_match_not_full_match() {
        let f = filter(&["https://docs"], &[]);
        assert!(f.admit("https://docs.example.com/a/b/c"));
        assert!(!f.admit("https://www.example.com/https://docs"));
    }

    #[test]
    fn test_empty_rules_accept_all_http() {
        let f = filter(&[], &[]);
        assert!(f.admit("http://anything.org/page"));
        assert!(!f.admit("mailto:someone@example.com"));
        assert!(!f.admit("ftp://files.example.com/a"));
    }

    #[test]
    fn test_archives_and_images_rejected_documents_admitted() {
        let f = filter(&[], &[]);
        assert!(!f.admit("https://a.com/dump.zip"));
        assert!(!f.admit("https://a.com/logo.png"));
        assert!(f.admit("https://a.com/paper.pdf"));
    }

    #[test]
    fn test_malformed_pattern_fails_compile() {
        let err = AdmissionRules::compile(&["(unclosed".to_string()], &[]).unwrap_err();
        assert_eq!(err.pattern, "(unclosed");
    }

    #[test]
    fn test_stray_parentheses_are_not_balanced_by_anchoring() {
        let err = AdmissionRules::compile(&[], &["a)(b".to_string()]).unwrap_err();
        assert_eq!(err.pattern, "a)(b");
        assert!(Pattern::new("a)(b").is_err());
    }
}
