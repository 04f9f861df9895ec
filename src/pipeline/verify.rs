use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::LinkCheckConfig;
use crate::rate_limiter::{Limits, RateLimiter};

/// Issues a liveness probe for one URL. The production adapter is reqwest;
/// tests substitute canned statuses and delays.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    /// Returns the HTTP status code, or an error string on any transport
    /// failure (connection refused, DNS, timeout).
    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, String>;
}

pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkProbe for ReqwestProbe {
    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, String> {
        let resp = self
            .client
            .head(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(resp.status().as_u16())
    }
}

/// Point-in-time liveness checks over a batch of URLs, bounded to a fixed
/// worker count. No retries and no caching across runs.
pub struct LinkVerifier {
    probe: Arc<dyn LinkProbe>,
    limiter: RateLimiter,
    timeout: Duration,
    excluded_domains: Vec<String>,
}

impl LinkVerifier {
    pub fn new(config: &LinkCheckConfig, probe: Arc<dyn LinkProbe>) -> Self {
        Self {
            probe,
            limiter: RateLimiter::new(Limits {
                requests_per_min: None,
                concurrency: Some(config.concurrency),
            }),
            timeout: Duration::from_secs(config.timeout_seconds),
            excluded_domains: config.excluded_domains.clone(),
        }
    }

    // Screens URLs that never reach the network. Some(verdict) short-circuits
    // the probe.
    fn screen(&self, url: &str) -> Option<bool> {
        let lowered = url.trim().to_lowercase();
        if !lowered.starts_with("http://") && !lowered.starts_with("https://") {
            return Some(false);
        }
        if self
            .excluded_domains
            .iter()
            .any(|domain| lowered.contains(domain.as_str()))
        {
            return Some(false);
        }
        None
    }

    /// Probes every URL concurrently and returns exactly one keep/drop
    /// verdict per input id, reconstituted by id rather than arrival order.
    /// A failed or panicked probe marks its own id dead and nothing else.
    pub async fn verify(&self, urls: HashMap<usize, String>) -> HashMap<usize, bool> {
        let mut results: HashMap<usize, bool> = HashMap::with_capacity(urls.len());
        let mut set = JoinSet::new();

        for (id, url) in urls {
            if let Some(verdict) = self.screen(&url) {
                debug!("Rejected without probe: {}", url);
                results.insert(id, verdict);
                continue;
            }

            // Pre-mark the id dead so a lost task cannot lose the result.
            results.insert(id, false);

            let probe = self.probe.clone();
            let limiter = self.limiter.clone();
            let timeout = self.timeout;
            set.spawn(async move {
                let _permit = limiter.acquire().await;
                let alive = match probe.head(&url, timeout).await {
                    Ok(status) => status < 400,
                    Err(e) => {
                        debug!("Probe failed for {}: {}", url, e);
                        false
                    }
                };
                (id, alive)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((id, alive)) => {
                    results.insert(id, alive);
                }
                Err(e) => {
                    warn!("Probe task aborted: {}", e);
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Canned probe: status per URL, optional per-call delay, call counter.
    struct StubProbe {
        statuses: HashMap<String, Result<u16, String>>,
        calls: AtomicUsize,
    }

    impl StubProbe {
        fn new(statuses: HashMap<String, Result<u16, String>>) -> Self {
            Self {
                statuses,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LinkProbe for StubProbe {
        async fn head(&self, url: &str, _timeout: Duration) -> Result<u16, String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            // Vary completion order: even calls answer slowly.
            if call % 2 == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            self.statuses
                .get(url)
                .cloned()
                .unwrap_or(Err("unknown url".to_string()))
        }
    }

    fn verifier_with(probe: Arc<dyn LinkProbe>) -> LinkVerifier {
        LinkVerifier::new(&LinkCheckConfig::default(), probe)
    }

    #[tokio::test]
    async fn test_non_http_and_excluded_urls_skip_the_network() {
        let probe = Arc::new(StubProbe::new(HashMap::new()));
        let verifier = verifier_with(probe.clone());

        let urls: HashMap<usize, String> = [
            (0, "ftp://archive.example.org/file".to_string()),
            (1, "not a url".to_string()),
            (2, "https://facebook.com/somepage".to_string()),
        ]
        .into();
        let results = verifier.verify(urls).await;

        assert_eq!(results.len(), 3);
        assert!(results.values().all(|alive| !alive));
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_errors_and_server_failures_count_as_dead() {
        let statuses: HashMap<String, Result<u16, String>> = [
            ("https://ok.example.org".to_string(), Ok(200)),
            ("https://redirected.example.org".to_string(), Ok(301)),
            ("https://gone.example.org".to_string(), Ok(404)),
            ("https://broken.example.org".to_string(), Ok(500)),
            (
                "https://dead.example.org".to_string(),
                Err("connection timed out".to_string()),
            ),
        ]
        .into();
        let probe = Arc::new(StubProbe::new(statuses));
        let verifier = verifier_with(probe);

        let urls: HashMap<usize, String> = [
            (10, "https://ok.example.org".to_string()),
            (11, "https://redirected.example.org".to_string()),
            (12, "https://gone.example.org".to_string()),
            (13, "https://broken.example.org".to_string()),
            (14, "https://dead.example.org".to_string()),
        ]
        .into();
        let results = verifier.verify(urls).await;

        assert_eq!(results[&10], true);
        assert_eq!(results[&11], true);
        assert_eq!(results[&12], false);
        assert_eq!(results[&13], false);
        assert_eq!(results[&14], false);
    }

    #[tokio::test]
    async fn test_every_id_gets_exactly_one_result_by_attribution() {
        // 100 URLs, 30 alive, mixed delays; results must come back keyed by
        // id no matter the completion order.
        let mut statuses = HashMap::new();
        let mut urls = HashMap::new();
        for i in 0..100usize {
            let url = format!("https://host-{}.example.org/health", i);
            let result = if i % 10 < 3 {
                Ok(200)
            } else if i % 2 == 0 {
                Ok(500)
            } else {
                Err("timed out".to_string())
            };
            statuses.insert(url.clone(), result);
            urls.insert(i, url);
        }
        let probe = Arc::new(StubProbe::new(statuses));
        let verifier = verifier_with(probe);

        let results = verifier.verify(urls).await;

        assert_eq!(results.len(), 100);
        let alive: Vec<usize> = results
            .iter()
            .filter(|(_, alive)| **alive)
            .map(|(id, _)| *id)
            .collect();
        assert_eq!(alive.len(), 30);
        for id in alive {
            assert!(id % 10 < 3, "id {} should not have been alive", id);
        }
    }
}
