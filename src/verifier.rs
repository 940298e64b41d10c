// src/verifier.rs
// =============================================================================
// The crawl-and-verify pipeline: discover pages, collect links from every
// page, then verify each unique link once and build the report.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::info;
use url::Url;

use crate::checker::{verify_concurrent, verify_sequential, LinkExtractor, LinkRecord, VerifyState};
use crate::crawl::{discover_batched, discover_sequential};
use crate::report::VerificationReport;

/// Discovery batches are capped so traversal never opens more than this
/// many simultaneous connections, however large the worker pool is.
const DISCOVERY_BATCH_CAP: usize = 5;

const USER_AGENT: &str = "llm-d-docs-verifier/1.0 (Link Checker)";

/// Run configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Politeness delay between requests (sequential mode) or between
    /// discovery batches (concurrent mode, at half strength).
    pub delay: Duration,
    /// Worker pool size; concurrent mode only.
    pub workers: usize,
    /// One page and one link at a time instead of the worker pool.
    pub sequential: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "https://llm-d.ai".to_string(),
            timeout: Duration::from_secs(30),
            delay: Duration::from_secs(1),
            workers: 10,
            sequential: false,
        }
    }
}

/// Crawls a site and verifies every link found on it.
pub struct Verifier {
    client: Client,
    base_url: Url,
    settings: Settings,
    state: Arc<VerifyState>,
}

impl Verifier {
    /// Builds the verifier and its pooled HTTP client. Fails only on an
    /// unparseable base URL or a client construction error; everything
    /// after this point is handled, not propagated.
    pub fn new(settings: Settings) -> Result<Self> {
        let base_url = Url::parse(&settings.base_url)
            .with_context(|| format!("invalid base URL '{}'", settings.base_url))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .pool_max_idle_per_host(settings.workers.max(1))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            settings,
            state: Arc::new(VerifyState::new()),
        })
    }

    /// Runs the full pipeline and returns the report.
    pub async fn run(&self) -> Result<VerificationReport> {
        info!("Starting link verification for {}", self.base_url);

        let extractor = LinkExtractor::new(self.client.clone());

        let pages = if self.settings.sequential {
            discover_sequential(&extractor, &self.base_url).await
        } else {
            let batch_size = DISCOVERY_BATCH_CAP.min(self.settings.workers.max(1));
            discover_batched(&extractor, &self.base_url, batch_size, self.settings.delay / 2).await
        };
        info!("Found {} pages to check", pages.len());

        let records = self.collect_links(&extractor, &pages).await;
        info!("Found {} unique links to verify", records.len());

        let successful = if self.settings.sequential {
            verify_sequential(&self.client, &self.state, &records, self.settings.delay).await
        } else {
            verify_concurrent(&self.client, &self.state, &records, self.settings.workers).await
        };

        let report = VerificationReport::build(&records, &self.state, successful).await;
        report.log_summary();
        Ok(report)
    }

    /// Re-fetches every discovered page and merges its links into one
    /// record per unique target, preserving first-seen display form and
    /// source order.
    async fn collect_links(&self, extractor: &LinkExtractor, pages: &[String]) -> Vec<LinkRecord> {
        let per_page: Vec<(String, Vec<crate::link::NormalizedLink>)> = if self.settings.sequential
        {
            let mut collected = Vec::with_capacity(pages.len());
            for page in pages {
                let links = extractor.links_on_page(page).await;
                collected.push((page.clone(), links));
                tokio::time::sleep(self.settings.delay).await;
            }
            collected
        } else {
            use futures::stream::{self, StreamExt};
            stream::iter(pages.iter().cloned())
                .map(|page| async move {
                    let links = extractor.links_on_page(&page).await;
                    (page, links)
                })
                .buffer_unordered(self.settings.workers.max(1))
                .collect()
                .await
        };

        let mut by_target: HashMap<String, usize> = HashMap::new();
        let mut records: Vec<LinkRecord> = Vec::new();

        for (page, links) in per_page {
            for link in links {
                match by_target.get(&link.target) {
                    Some(&idx) => records[idx].sources.push(page.clone()),
                    None => {
                        by_target.insert(link.target.clone(), records.len());
                        records.push(LinkRecord {
                            target: link.target,
                            display: link.display,
                            sources: vec![page.clone()],
                        });
                    }
                }
            }
        }

        records
    }
}
