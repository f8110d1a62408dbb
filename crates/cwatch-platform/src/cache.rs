//! Conditional-fetch validator cache.
//!
//! Stores the last-seen cache validator (ETag) per platform resource so
//! clients can issue `If-None-Match` requests and skip unchanged payloads.
//! Consulted before every cacheable request; written after every fresh
//! response. A plain namespaced key-value wrapper — the quota savings happen
//! in the clients that honor it.

use std::sync::Arc;
use std::time::Duration;

use crate::error::KvError;
use crate::kv::KvStore;

/// Validators go stale after a day; a re-fetch then repopulates them.
const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

#[derive(Clone)]
pub struct ValidatorCache {
    store: Arc<dyn KvStore>,
}

impl ValidatorCache {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    fn cache_key(platform: &str, resource: &str) -> String {
        format!("etag:{platform}:{resource}")
    }

    /// Last validator seen for `resource`, if still fresh.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] only when the backing store is unreachable.
    pub async fn get(&self, platform: &str, resource: &str) -> Result<Option<String>, KvError> {
        self.store.get(&Self::cache_key(platform, resource)).await
    }

    /// Records `validator` for `resource` with the default 24 h TTL.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] only when the backing store is unreachable.
    pub async fn set(
        &self,
        platform: &str,
        resource: &str,
        validator: &str,
    ) -> Result<(), KvError> {
        self.store
            .set(&Self::cache_key(platform, resource), validator, DEFAULT_TTL)
            .await
    }
}
