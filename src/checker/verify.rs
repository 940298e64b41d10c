// src/checker/verify.rs
// =============================================================================
// Link verification engine.
//
// Every unique link is probed at most once. A HEAD request is tried first;
// a 405 or any transport failure falls back to GET. Only an actual HTTP
// 404 or 500 response counts as broken; a server we cannot reach at all is
// treated as transient and therefore not broken.
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use tokio::sync::{Mutex, Semaphore};
use tracing::{error, info, warn};

/// A unique link target plus everywhere it was seen.
///
/// One record per normalized target URL across the whole site. `sources`
/// is in first-seen order; error attribution uses the first entry.
#[derive(Debug, Clone)]
pub struct LinkRecord {
    pub target: String,
    pub display: String,
    pub sources: Vec<String>,
}

/// How a probed link was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Reached the server and the status was not 404/500, or the probe
    /// failed for a transient transport reason.
    Successful,
    /// Server-confirmed failure (404 or 500); carries the reason phrase.
    Broken(String),
}

/// Shared mutable state of the verification phase.
///
/// Mutated by every concurrent verification task; each set is its own
/// critical section. Frozen (read-only) once verification completes.
#[derive(Default)]
pub struct VerifyState {
    /// URLs for which a probe was started. Admission is an atomic
    /// insert-if-absent: whoever loses the race reads the cached outcome
    /// instead of probing again.
    pub checked: Mutex<HashSet<String>>,
    pub successful: Mutex<HashSet<String>>,
    /// Broken URL -> ordered (source page, error) pairs.
    pub broken: Mutex<HashMap<String, Vec<(String, String)>>>,
}

impl VerifyState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Checks one link, recording the outcome in the shared state.
///
/// Returns true when the link is not broken. If the URL was already
/// claimed by another task, no network probe happens and the cached
/// classification is returned.
pub async fn check_link(client: &Client, state: &VerifyState, url: &str, source: &str) -> bool {
    {
        let mut checked = state.checked.lock().await;
        if !checked.insert(url.to_string()) {
            return state.successful.lock().await.contains(url);
        }
    }

    info!("Checking link: {}", url);

    match classify(probe(client, url).await) {
        Classification::Successful => {
            state.successful.lock().await.insert(url.to_string());
            info!("Link OK: {}", url);
            true
        }
        Classification::Broken(reason) => {
            warn!("Link broken: {} - {}", url, reason);
            state
                .broken
                .lock()
                .await
                .entry(url.to_string())
                .or_default()
                .push((source.to_string(), reason));
            false
        }
    }
}

/// HEAD first, falling back to GET on a 405 or any transport failure.
async fn probe(client: &Client, url: &str) -> Result<StatusCode, reqwest::Error> {
    match client.head(url).send().await {
        Ok(response) if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
            client.get(url).send().await.map(|r| r.status())
        }
        Ok(response) => Ok(response.status()),
        Err(_) => client.get(url).send().await.map(|r| r.status()),
    }
}

/// The classification policy.
///
/// Only a response actually received from the origin with status 404 or
/// 500 is broken. Timeouts, connection failures, and every other status
/// code are acceptable.
fn classify(outcome: Result<StatusCode, reqwest::Error>) -> Classification {
    match outcome {
        Ok(status @ (StatusCode::NOT_FOUND | StatusCode::INTERNAL_SERVER_ERROR)) => {
            let reason = status.canonical_reason().unwrap_or("server error");
            Classification::Broken(reason.to_string())
        }
        Ok(_) => Classification::Successful,
        Err(e) if e.is_timeout() => Classification::Successful,
        Err(e) if e.is_connect() => Classification::Successful,
        Err(_) => Classification::Successful,
    }
}

/// Sequential driver: one link at a time with a politeness delay between
/// checks. Returns the number of successful links.
pub async fn verify_sequential(
    client: &Client,
    state: &VerifyState,
    records: &[LinkRecord],
    delay: std::time::Duration,
) -> usize {
    let mut successful = 0;

    for record in records {
        let source = record.sources.first().map(String::as_str).unwrap_or("");
        if check_link(client, state, &record.target, source).await {
            successful += 1;
        }
        tokio::time::sleep(delay).await;
    }

    successful
}

/// Concurrent driver: submits every record to a bounded worker pool and
/// joins at a wait-for-all point. No inter-request delay; the pool size
/// is the throttle. Returns the number of successful links.
///
/// A task that panics is caught at the join boundary and its URL is
/// conservatively recorded as broken, so one bad task can neither crash
/// the run nor vanish from the report.
pub async fn verify_concurrent(
    client: &Client,
    state: &Arc<VerifyState>,
    records: &[LinkRecord],
    workers: usize,
) -> usize {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handles = Vec::with_capacity(records.len());

    for record in records {
        let url = record.target.clone();
        let source = record
            .sources
            .first()
            .cloned()
            .unwrap_or_default();
        let client = client.clone();
        let state = Arc::clone(state);
        let semaphore = Arc::clone(&semaphore);

        let handle = tokio::spawn({
            let url = url.clone();
            let source = source.clone();
            async move {
                // Never closed, so acquire only fails if the semaphore is
                // dropped, which cannot happen while we hold a clone.
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                check_link(&client, &state, &url, &source).await
            }
        });

        handles.push((url, source, handle));
    }

    let mut successful = 0;
    for (url, source, handle) in handles {
        match handle.await {
            Ok(true) => successful += 1,
            Ok(false) => {}
            Err(e) => {
                error!("Verification task for {} failed: {}", url, e);
                state
                    .broken
                    .lock()
                    .await
                    .entry(url)
                    .or_default()
                    .push((source, format!("task failed: {}", e)));
            }
        }
    }

    successful
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    async fn classify_status(status: u16) -> Classification {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/probe"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let url = format!("{}/probe", server.uri());
        classify(probe(&client(), &url).await)
    }

    #[tokio::test]
    async fn test_404_is_broken_not_found() {
        assert_eq!(
            classify_status(404).await,
            Classification::Broken("Not Found".to_string())
        );
    }

    #[tokio::test]
    async fn test_500_is_broken_internal_server_error() {
        assert_eq!(
            classify_status(500).await,
            Classification::Broken("Internal Server Error".to_string())
        );
    }

    #[tokio::test]
    async fn test_other_statuses_are_successful() {
        assert_eq!(classify_status(200).await, Classification::Successful);
        assert_eq!(classify_status(301).await, Classification::Successful);
        assert_eq!(classify_status(403).await, Classification::Successful);
    }

    #[tokio::test]
    async fn test_timeout_is_successful() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let slow_client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let outcome = classify(probe(&slow_client, &server.uri()).await);
        assert_eq!(outcome, Classification::Successful);
    }

    #[tokio::test]
    async fn test_connection_failure_is_successful() {
        // Port 1 is never listening.
        let outcome = classify(probe(&client(), "http://127.0.0.1:1/").await);
        assert_eq!(outcome, Classification::Successful);
    }

    #[tokio::test]
    async fn test_head_405_falls_back_to_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/page", server.uri());
        let state = VerifyState::new();
        assert!(check_link(&client(), &state, &url, "source").await);
    }

    #[tokio::test]
    async fn test_each_url_probed_at_most_once() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/once"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/once", server.uri());
        let state = Arc::new(VerifyState::new());
        let records: Vec<LinkRecord> = (0..8)
            .map(|i| LinkRecord {
                target: url.clone(),
                display: url.clone(),
                sources: vec![format!("{}/page{}", server.uri(), i)],
            })
            .collect();

        let successful = verify_concurrent(&client(), &state, &records, 4).await;
        // One probe happened (wiremock expectation), every task observed
        // a classification.
        assert!(successful >= 1);
        assert_eq!(state.checked.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_broken_link_records_first_source() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let state = VerifyState::new();
        assert!(!check_link(&client(), &state, &url, "https://example.com/").await);

        let broken = state.broken.lock().await;
        assert_eq!(
            broken.get(&url).unwrap(),
            &vec![(
                "https://example.com/".to_string(),
                "Not Found".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_sequential_counts_successes() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let state = VerifyState::new();
        let records = vec![
            LinkRecord {
                target: format!("{}/ok", server.uri()),
                display: format!("{}/ok", server.uri()),
                sources: vec![server.uri()],
            },
            LinkRecord {
                target: format!("{}/missing", server.uri()),
                display: format!("{}/missing", server.uri()),
                sources: vec![server.uri()],
            },
        ];

        let successful =
            verify_sequential(&client(), &state, &records, Duration::from_millis(1)).await;
        assert_eq!(successful, 1);
        assert_eq!(state.broken.lock().await.len(), 1);
    }
}
