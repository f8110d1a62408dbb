//! Token-bucket limiter over the shared key-value collaborator.
//!
//! One bucket per quota key (e.g. `yt:units`). Capacity and refill rate live
//! on the limiter; the mutable counter lives in the [`KvStore`] so separate
//! workers throttling the same platform share one budget. Every attempt is a
//! single atomic `take_tokens` call — no read-then-write across round trips.

use std::sync::Arc;
use std::time::Duration;

use crate::error::KvError;
use crate::kv::{BucketState, KvStore};

/// Sleep between blocked acquisition attempts.
const RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Bucket state ages out after an hour without traffic.
const IDLE_TTL: Duration = Duration::from_secs(3600);

pub struct TokenBucket {
    store: Arc<dyn KvStore>,
    key: String,
    capacity: f64,
    refill_per_sec: f64,
}

impl TokenBucket {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, key: impl Into<String>, capacity: f64, refill_per_sec: f64) -> Self {
        Self {
            store,
            key: key.into(),
            capacity,
            refill_per_sec,
        }
    }

    /// Tries to take `cost` tokens from the bucket.
    ///
    /// Returns `Ok(true)` when granted. On shortfall, a non-blocking call
    /// returns `Ok(false)` immediately; a blocking call re-attempts every
    /// 200 ms until `timeout` elapses, then returns `Ok(false)`. Callers must
    /// treat `false` as quota exhaustion and fail the surrounding operation —
    /// never proceed without a grant.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] only when the backing store is unreachable.
    pub async fn acquire(
        &self,
        cost: f64,
        blocking: bool,
        timeout: Duration,
    ) -> Result<bool, KvError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let grant = self
                .store
                .take_tokens(&self.key, cost, self.capacity, self.refill_per_sec, IDLE_TTL)
                .await?;
            if grant.granted {
                return Ok(true);
            }
            if !blocking || tokio::time::Instant::now() >= deadline {
                tracing::debug!(
                    key = %self.key,
                    cost,
                    available = grant.available,
                    "token bucket shortfall"
                );
                return Ok(false);
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    /// Current bucket contents, for the quota metrics surface.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] only when the backing store is unreachable.
    pub async fn state(&self) -> Result<Option<BucketState>, KvError> {
        self.store.read_bucket(&self.key).await
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}
