// src/checker/extract.rs
// =============================================================================
// Fetches a page and extracts the normalized set of links it contains.
//
// Extraction failures are never fatal: a page that cannot be fetched or
// parsed simply contributes zero links, and the error is logged.
// =============================================================================

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{error, info};
use url::Url;

use crate::link::{normalize, NormalizedLink};

/// Fetches pages and turns their markup into normalized link sets.
///
/// Holds a clone of the shared HTTP client, so every extractor reuses the
/// same connection pool and timeout configuration.
#[derive(Clone)]
pub struct LinkExtractor {
    client: Client,
}

impl LinkExtractor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns the deduplicated, normalized links found on a page.
    ///
    /// Any transport error or non-success HTTP status yields an empty
    /// list; the crawl continues without this page's links.
    pub async fn links_on_page(&self, page_url: &str) -> Vec<NormalizedLink> {
        info!("Fetching page: {}", page_url);

        match self.fetch(page_url).await {
            Ok(body) => extract_links(&body, page_url),
            Err(e) => {
                error!("Error fetching page {}: {}", page_url, e);
                Vec::new()
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP {}", response.status()));
        }

        Ok(response.text().await?)
    }
}

/// Parses anchor hrefs out of an HTML body and normalizes them relative
/// to the page's own URL.
///
/// Skips empty hrefs and the `mailto:` / `tel:` schemes. The result is a
/// set: each normalized link appears once regardless of how many anchors
/// pointed at it.
pub fn extract_links(html: &str, page_url: &str) -> Vec<NormalizedLink> {
    let base = match Url::parse(page_url) {
        Ok(url) => url,
        Err(e) => {
            error!("Invalid page URL {}: {}", page_url, e);
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    // Constant selector, known valid.
    let selector = Selector::parse("a[href]").unwrap();

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();

        if href.is_empty() || href.starts_with("mailto:") || href.starts_with("tel:") {
            continue;
        }

        if let Some(link) = normalize(href, &base) {
            if seen.insert(link.display.clone()) {
                links.push(link);
            }
        }
    }

    links
}
