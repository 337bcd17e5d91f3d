// src/sitemap.rs
// =============================================================================
// Lists page URLs from a site's sitemap.xml instead of crawling.
//
// Two kinds of files exist:
// - <urlset>: each <loc> is a page
// - <sitemapindex>: each <loc> is another sitemap to read
//
// A failing sitemap is logged and skipped; the URLs found so far are kept.
// =============================================================================

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::fetch::PageFetcher;

fn loc_regex() -> &'static Regex {
    static LOC: OnceLock<Regex> = OnceLock::new();
    // Constant pattern, known to be valid
    LOC.get_or_init(|| Regex::new(r"(?is)<loc>\s*(.*?)\s*</loc>").expect("valid <loc> regex"))
}

// Where to look for the sitemap of a seed URL
//
// Examples:
//   "https://a.com"             -> "https://a.com/sitemap.xml"
//   "https://a.com/"            -> "https://a.com/sitemap.xml"
//   "https://a.com/pages.xml"   -> "https://a.com/pages.xml"
pub fn sitemap_location(seed: &str) -> String {
    if seed.ends_with(".xml") {
        seed.to_string()
    } else {
        format!("{}/sitemap.xml", seed.trim_end_matches('/'))
    }
}

fn entity_regex() -> &'static Regex {
    static ENTITY: OnceLock<Regex> = OnceLock::new();
    ENTITY.get_or_init(|| {
        Regex::new(r"&(amp|lt|gt|quot|apos|#[0-9]+|#[xX][0-9a-fA-F]+);")
            .expect("valid entity regex")
    })
}

// Decodes the five XML entities and numeric character references.
// A reference to an invalid code point is left as written.
fn decode_entities(text: &str) -> String {
    entity_regex()
        .replace_all(text, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => name[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

// Pulls every <loc> value out of a sitemap document
pub fn parse_locations(xml: &str) -> Vec<String> {
    loc_regex()
        .captures_iter(xml)
        .map(|caps| decode_entities(&caps[1]))
        .filter(|loc| !loc.is_empty())
        .collect()
}

pub async fn urls_from_sitemap(fetcher: &dyn PageFetcher, seed: &str) -> Vec<String> {
    let mut pending = vec![sitemap_location(seed)];
    let mut read = HashSet::new();
    let mut pages = Vec::new();

    while let Some(location) = pending.pop() {
        if !read.insert(location.clone()) {
            continue;
        }

        let xml = match fetcher.fetch(&location).await {
            Ok(page) => page.content,
            Err(e) => {
                warn!(sitemap = %location, error = %e, "failed to read sitemap");
                continue;
            }
        };

        let locations = parse_locations(&xml);
        if xml.contains("<sitemapindex") {
            debug!(sitemap = %location, children = locations.len(), "sitemap index");
            pending.extend(locations);
        } else {
            pages.extend(locations);
        }
    }

    pages
}
