//! Shared key-value collaborator for limiter and cache state.
//!
//! The trait is the only cross-invocation coordination surface in the system:
//! multiple workers crawling the same platform contend for one quota key
//! through it. [`KvStore::take_tokens`] is a single atomic read-modify-write —
//! refill, compare, deduct happen in one step, never as a read followed by a
//! separate write, so concurrent callers cannot lose updates.
//!
//! [`MemoryKv`] is the in-process implementation and the test fake; a
//! networked backend (e.g. a Redis hash plus a script) would implement the
//! same trait for multi-process deployments.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::KvError;

/// Outcome of one token acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenGrant {
    pub granted: bool,
    /// Tokens left in the bucket after this attempt.
    pub available: f64,
}

/// Point-in-time bucket contents, read without mutating. Metrics only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketState {
    pub tokens: f64,
    pub capacity: f64,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads a plain value, honoring expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Writes a plain value with a time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError>;

    /// Atomically refills the bucket under `key` and tries to deduct `cost`.
    ///
    /// A missing or expired bucket starts full at `capacity`. The entry's
    /// expiry is pushed out to `idle_ttl` on every attempt so active keys
    /// stay warm and idle keys age out.
    async fn take_tokens(
        &self,
        key: &str,
        cost: f64,
        capacity: f64,
        refill_per_sec: f64,
        idle_ttl: Duration,
    ) -> Result<TokenGrant, KvError>;

    /// Reads bucket contents without refilling or deducting.
    async fn read_bucket(&self, key: &str) -> Result<Option<BucketState>, KvError>;
}

#[derive(Debug)]
struct ValueEntry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct BucketEntry {
    tokens: f64,
    capacity: f64,
    last_refill: Instant,
    expires_at: Instant,
}

/// In-memory [`KvStore`] backed by `tokio::sync::Mutex`.
///
/// The mutex makes `take_tokens` atomic across concurrent tasks. Timekeeping
/// uses `tokio::time::Instant`, so tests can drive refill with
/// `tokio::time::{pause, advance}`.
#[derive(Debug, Default)]
pub struct MemoryKv {
    values: Mutex<HashMap<String, ValueEntry>>,
    buckets: Mutex<HashMap<String, BucketEntry>>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut values = self.values.lock().await;
        let now = Instant::now();
        match values.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                values.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        let mut values = self.values.lock().await;
        values.insert(
            key.to_owned(),
            ValueEntry {
                value: value.to_owned(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn take_tokens(
        &self,
        key: &str,
        cost: f64,
        capacity: f64,
        refill_per_sec: f64,
        idle_ttl: Duration,
    ) -> Result<TokenGrant, KvError> {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();

        // Expired entries restart full, same as never-seen keys.
        let needs_reset = buckets.get(key).is_none_or(|entry| entry.expires_at <= now);
        if needs_reset {
            buckets.insert(
                key.to_owned(),
                BucketEntry {
                    tokens: capacity,
                    capacity,
                    last_refill: now,
                    expires_at: now + idle_ttl,
                },
            );
        }
        let entry = buckets
            .get_mut(key)
            .ok_or_else(|| KvError::Unavailable("bucket entry vanished after insert".to_owned()))?;

        let elapsed = now.duration_since(entry.last_refill).as_secs_f64();
        entry.tokens = (entry.tokens + elapsed * refill_per_sec).min(capacity);
        entry.capacity = capacity;
        entry.last_refill = now;
        entry.expires_at = now + idle_ttl;

        let granted = entry.tokens >= cost;
        if granted {
            entry.tokens -= cost;
        }

        Ok(TokenGrant {
            granted,
            available: entry.tokens,
        })
    }

    async fn read_bucket(&self, key: &str) -> Result<Option<BucketState>, KvError> {
        let buckets = self.buckets.lock().await;
        let now = Instant::now();
        Ok(buckets
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| BucketState {
                tokens: entry.tokens,
                capacity: entry.capacity,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn get_returns_what_set_stored() {
        let kv = MemoryKv::new();
        kv.set("etag:yt:channels:abc", "W/\"xyz\"", TTL)
            .await
            .unwrap();
        let value = kv.get("etag:yt:channels:abc").await.unwrap();
        assert_eq!(value.as_deref(), Some("W/\"xyz\""));
    }

    #[tokio::test]
    async fn get_misses_after_ttl_elapses() {
        tokio::time::pause();
        let kv = MemoryKv::new();
        kv.set("k", "v", Duration::from_secs(60)).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(kv.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fresh_bucket_starts_at_capacity() {
        let kv = MemoryKv::new();
        let grant = kv.take_tokens("yt:units", 1.0, 10.0, 0.0, TTL).await.unwrap();
        assert!(grant.granted);
        assert!((grant.available - 9.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn deduction_is_visible_to_subsequent_attempts() {
        let kv = MemoryKv::new();
        for _ in 0..10 {
            assert!(kv
                .take_tokens("yt:units", 1.0, 10.0, 0.0, TTL)
                .await
                .unwrap()
                .granted);
        }
        let denied = kv.take_tokens("yt:units", 1.0, 10.0, 0.0, TTL).await.unwrap();
        assert!(!denied.granted);
    }

    #[tokio::test]
    async fn refill_restores_tokens_over_time() {
        tokio::time::pause();
        let kv = MemoryKv::new();
        // Drain the bucket.
        for _ in 0..10 {
            kv.take_tokens("yt:units", 1.0, 10.0, 10.0, TTL).await.unwrap();
        }
        tokio::time::advance(Duration::from_millis(500)).await;
        // 0.5 s at 10/s refills 5 tokens.
        let grant = kv.take_tokens("yt:units", 4.0, 10.0, 10.0, TTL).await.unwrap();
        assert!(grant.granted);
    }

    #[tokio::test]
    async fn refill_never_exceeds_capacity() {
        tokio::time::pause();
        let kv = MemoryKv::new();
        kv.take_tokens("yt:units", 1.0, 10.0, 10.0, TTL).await.unwrap();
        tokio::time::advance(Duration::from_secs(120)).await;
        let grant = kv.take_tokens("yt:units", 0.0, 10.0, 10.0, TTL).await.unwrap();
        assert!((grant.available - 10.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn idle_bucket_expires_and_restarts_full() {
        tokio::time::pause();
        let kv = MemoryKv::new();
        for _ in 0..10 {
            kv.take_tokens("yt:units", 1.0, 10.0, 0.0, TTL).await.unwrap();
        }
        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        assert!(kv.read_bucket("yt:units").await.unwrap().is_none());
        let grant = kv.take_tokens("yt:units", 1.0, 10.0, 0.0, TTL).await.unwrap();
        assert!(grant.granted);
    }

    #[tokio::test]
    async fn read_bucket_does_not_mutate() {
        let kv = MemoryKv::new();
        kv.take_tokens("yt:units", 3.0, 10.0, 0.0, TTL).await.unwrap();
        let before = kv.read_bucket("yt:units").await.unwrap().unwrap();
        let after = kv.read_bucket("yt:units").await.unwrap().unwrap();
        assert_eq!(before, after);
        assert!((before.tokens - 7.0).abs() < f64::EPSILON);
    }
}
