//! HTML extractor for page links and candidate images
//!
//! This module handles parsing fetched HTML to extract:
//! - Same-domain links to follow (from `<a>` tags)
//! - Candidate image URLs from `<img src>`, `<picture><source srcset>` and
//!   CSS `url(...)` tokens anywhere in the raw document text
//!
//! Parsing is tolerant: malformed markup never produces an error, unparseable
//! fragments are skipped.

use crate::url::{normalize, same_domain, BaseHost, ExtensionPolicy};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Pattern for CSS `url(...)` tokens, quoted or not
const CSS_URL_PATTERN: &str = r#"url\(["']?([^"'()]+)["']?\)"#;

/// Links and image candidates found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Normalized same-domain page links, first-seen order, no duplicates
    pub links: Vec<Url>,

    /// Absolute image URLs, first-seen order, no duplicates
    pub images: Vec<Url>,
}

/// Parses a page once and extracts both links and images
///
/// # Example
///
/// ```
/// use image_crawler::crawler::parse_page;
/// use image_crawler::url::{BaseHost, ExtensionPolicy};
/// use url::Url;
///
/// let page = Url::parse("https://example.com/gallery").unwrap();
/// let base = BaseHost::from_url(&page).unwrap();
/// let html = r#"<a href="/about">About</a><img src="/cat.png">"#;
///
/// let parsed = parse_page(html, &page, &base, &ExtensionPolicy::default());
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/about");
/// assert_eq!(parsed.images[0].as_str(), "https://example.com/cat.png");
/// ```
pub fn parse_page(
    html: &str,
    page_url: &Url,
    base: &BaseHost,
    policy: &ExtensionPolicy,
) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        links: links_from_document(&document, page_url, base),
        images: images_from_document(&document, html, page_url, policy),
    }
}

/// Extracts candidate image URLs from a page
pub fn extract_images(html: &str, page_url: &Url, policy: &ExtensionPolicy) -> Vec<Url> {
    let document = Html::parse_document(html);
    images_from_document(&document, html, page_url, policy)
}

/// Extracts normalized same-domain links from a page
pub fn extract_links(html: &str, page_url: &Url, base: &BaseHost) -> Vec<Url> {
    let document = Html::parse_document(html);
    links_from_document(&document, page_url, base)
}

fn images_from_document(
    document: &Html,
    raw: &str,
    page_url: &Url,
    policy: &ExtensionPolicy,
) -> Vec<Url> {
    let mut images = UniqueUrls::default();

    // 1. <img src>
    if let Ok(selector) = Selector::parse("img[src]") {
        for element in document.select(&selector) {
            if let Some(src) = element.value().attr("src") {
                if let Some(url) = resolve_image(src, page_url, policy) {
                    images.push(url);
                }
            }
        }
    }

    // 2. <picture><source srcset>
    if let Ok(selector) = Selector::parse("picture source[srcset]") {
        for element in document.select(&selector) {
            let Some(srcset) = element.value().attr("srcset") else {
                continue;
            };
            for candidate in srcset_urls(srcset) {
                if let Some(url) = resolve_image(candidate, page_url, policy) {
                    images.push(url);
                }
            }
        }
    }

    // 3. CSS url(...) over the raw text, covering <style> blocks and style attributes
    if let Some(pattern) = css_url_regex() {
        for capture in pattern.captures_iter(raw) {
            let Some(token) = capture.get(1) else {
                continue;
            };
            if let Some(url) = resolve_image(token.as_str(), page_url, policy) {
                if policy.accepts_css_image(&url) {
                    images.push(url);
                }
            }
        }
    }

    images.into_vec()
}

fn links_from_document(document: &Html, page_url: &Url, base: &BaseHost) -> Vec<Url> {
    let mut links = UniqueUrls::default();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(url) = resolve_link(href, page_url) {
                    let url = normalize(&url);
                    if same_domain(&url, base) {
                        links.push(url);
                    }
                }
            }
        }
    }

    links.into_vec()
}

/// Leading URL token of each comma-separated `srcset` entry
fn srcset_urls(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
}

fn css_url_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(CSS_URL_PATTERN).ok())
        .as_ref()
}

/// Resolves an image reference, dropping non-http(s) and excluded formats
fn resolve_image(src: &str, page_url: &Url, policy: &ExtensionPolicy) -> Option<Url> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }

    let url = page_url.join(src).ok()?;
    if !is_http(&url) || policy.is_excluded_url(&url) {
        return None;
    }
    Some(url)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let url = page_url.join(href).ok()?;
    is_http(&url).then_some(url)
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Insertion-ordered URL set
#[derive(Default)]
struct UniqueUrls {
    seen: HashSet<String>,
    urls: Vec<Url>,
}

impl UniqueUrls {
    fn push(&mut self, url: Url) {
        if self.seen.insert(url.as_str().to_string()) {
            self.urls.push(url);
        }
    }

    fn into_vec(self) -> Vec<Url> {
        self.urls
    }
}
