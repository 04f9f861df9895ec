use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

/// Pacing limits for calls to an external service. Either bound may be
/// absent; an empty `Limits` turns `acquire` into a no-op.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub requests_per_min: Option<u64>,
    pub concurrency: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    limits: Limits,
    // token bucket modeled by the current tokens and the time of last refill
    rpm_tokens: Mutex<(f64, Instant)>,
    sem: Option<Arc<Semaphore>>,
}

/// Held while the rate-limited call is in flight; dropping it releases the
/// concurrency slot.
pub struct RatePermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl RateLimiter {
    pub fn new(limits: Limits) -> Self {
        let now = Instant::now();
        let sem = limits
            .concurrency
            .map(|c| Arc::new(Semaphore::new(c.max(1) as usize)));
        Self {
            inner: Arc::new(Inner {
                limits,
                // starts with one token so the first call goes straight through
                rpm_tokens: Mutex::new((1.0, now)),
                sem,
            }),
        }
    }

    /// Waits until a call is allowed, then hands back a permit the caller
    /// keeps for the duration of the call.
    pub async fn acquire(&self) -> RatePermit {
        let permit = match &self.inner.sem {
            Some(sem) => Some(
                sem.clone()
                    .acquire_owned()
                    .await
                    .expect("semaphore closed"),
            ),
            None => None,
        };

        if let Some(rpm) = self.inner.limits.requests_per_min {
            if rpm > 0 {
                self.consume_token(rpm as f64).await;
            }
        }

        RatePermit { _permit: permit }
    }

    // Single-token bucket: refills continuously at rpm/60 per second but
    // never holds more than one token, which enforces a minimum spacing
    // between consecutive calls instead of allowing bursts.
    async fn consume_token(&self, rpm: f64) {
        let refill_rate = rpm / 60.0; // tokens per second
        loop {
            let mut guard = self.inner.rpm_tokens.lock().await;
            let (ref mut tokens, ref mut last) = *guard;
            let now = Instant::now();
            let elapsed = now.duration_since(*last).as_secs_f64();
            *tokens = (*tokens + elapsed * refill_rate).min(1.0);
            *last = now;
            if *tokens >= 1.0 {
                *tokens = 0.0;
                return;
            }
            let wait_secs = (1.0 - *tokens) / refill_rate;
            drop(guard);
            tokio::time::sleep(Duration::from_secs_f64(wait_secs.max(0.001))).await;
        }
    }
}
