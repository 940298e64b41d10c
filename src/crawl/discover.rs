// src/crawl/discover.rs
// =============================================================================
// Breadth-first page discovery.
//
// Starts from the base URL and follows internal links only. A seen-set
// covering both queued and visited pages keeps the traversal finite even
// when pages link to each other in cycles.
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::info;
use url::Url;

use crate::checker::LinkExtractor;
use crate::link::{is_internal, same_path, NormalizedLink};

/// Discovers every internal page reachable from the base URL, one page at
/// a time. Returns page URLs in discovery order.
pub async fn discover_sequential(extractor: &LinkExtractor, base: &Url) -> Vec<String> {
    let mut queue = VecDeque::from([base.to_string()]);
    let mut seen = HashSet::from([base.to_string()]);
    let mut pages = Vec::new();

    while let Some(page_url) = queue.pop_front() {
        let links = extractor.links_on_page(&page_url).await;
        enqueue_internal(&page_url, &links, base, &mut seen, &mut queue);
        pages.push(page_url);
    }

    pages
}

/// Batched variant: dequeues up to `batch_size` pages at once and fetches
/// them in parallel, merging newly found internal links after each batch.
/// A politeness pause separates consecutive batches.
pub async fn discover_batched(
    extractor: &LinkExtractor,
    base: &Url,
    batch_size: usize,
    pause: Duration,
) -> Vec<String> {
    let batch_size = batch_size.max(1);
    let mut queue = VecDeque::from([base.to_string()]);
    let mut seen = HashSet::from([base.to_string()]);
    let mut pages = Vec::new();

    while !queue.is_empty() {
        if !pages.is_empty() {
            tokio::time::sleep(pause).await;
        }

        let batch: Vec<String> = (0..batch_size).filter_map(|_| queue.pop_front()).collect();

        let results: Vec<(String, Vec<NormalizedLink>)> = stream::iter(batch)
            .map(|page_url| async move {
                let links = extractor.links_on_page(&page_url).await;
                (page_url, links)
            })
            .buffer_unordered(batch_size)
            .collect()
            .await;

        for (page_url, links) in results {
            enqueue_internal(&page_url, &links, base, &mut seen, &mut queue);
            pages.push(page_url);
        }
    }

    pages
}

/// Queues the internal links of one page that have not been seen yet.
///
/// A link is queued only if it shares the base authority and its path
/// differs from the current page's (fragment and query variants of the
/// page being visited are not new pages).
fn enqueue_internal(
    page_url: &str,
    links: &[NormalizedLink],
    base: &Url,
    seen: &mut HashSet<String>,
    queue: &mut VecDeque<String>,
) {
    let current = match Url::parse(page_url) {
        Ok(url) => url,
        Err(_) => return,
    };

    for link in links {
        if is_internal(&link.target, base)
            && !same_path(&link.target, &current)
            && seen.insert(link.target.clone())
        {
            info!("Found internal page: {}", link.target);
            queue.push_back(link.target.clone());
        }
    }
}
