// src/report.rs
// =============================================================================
// Assembles the final verification report from the frozen shared state
// and renders it as a formatted log block or JSON.
// =============================================================================

use serde::Serialize;
use tracing::{error, info};

use crate::checker::{LinkRecord, VerifyState};

/// One (source page, error) observation for a broken link.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BrokenSource {
    pub source_page: String,
    pub error: String,
}

/// A broken link and everywhere it was recorded.
#[derive(Debug, Clone, Serialize)]
pub struct BrokenLink {
    pub url: String,
    pub sources: Vec<BrokenSource>,
}

/// Immutable snapshot of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub total_links: usize,
    pub successful_links: usize,
    pub broken_count: usize,
    pub broken_links: Vec<BrokenLink>,
}

impl VerificationReport {
    /// Builds the report once verification has finished and the shared
    /// state is read-only. Broken links are sorted by URL for stable
    /// output; each URL is reported in its display form (fragment kept
    /// for fragment-only links).
    pub async fn build(
        records: &[LinkRecord],
        state: &VerifyState,
        successful_links: usize,
    ) -> Self {
        let broken = state.broken.lock().await;

        let mut broken_links: Vec<BrokenLink> = broken
            .iter()
            .map(|(url, observations)| {
                let display = records
                    .iter()
                    .find(|r| &r.target == url)
                    .map(|r| r.display.clone())
                    .unwrap_or_else(|| url.clone());
                BrokenLink {
                    url: display,
                    sources: observations
                        .iter()
                        .map(|(source_page, error)| BrokenSource {
                            source_page: source_page.clone(),
                            error: error.clone(),
                        })
                        .collect(),
                }
            })
            .collect();
        broken_links.sort_by(|a, b| a.url.cmp(&b.url));

        Self {
            total_links: records.len(),
            successful_links,
            broken_count: broken_links.len(),
            broken_links,
        }
    }

    pub fn is_success(&self) -> bool {
        self.broken_links.is_empty()
    }

    /// Writes the human-readable results block to the log stream.
    pub fn log_summary(&self) {
        let rule = "=".repeat(60);

        info!("{}", rule);
        info!("LINK VERIFICATION RESULTS");
        info!("{}", rule);
        info!("Total links checked: {}", self.total_links);
        info!("Successful links: {}", self.successful_links);
        info!("Broken links: {}", self.broken_count);

        if self.is_success() {
            info!("All links are working properly!");
            return;
        }

        error!("{}", rule);
        error!("BROKEN LINKS FOUND:");
        error!("{}", rule);
        for link in &self.broken_links {
            error!("{}", link.url);
            for source in &link.sources {
                error!("   Found on: {}", source.source_page);
                error!("   Error: {}", source.error);
            }
        }
    }
}
