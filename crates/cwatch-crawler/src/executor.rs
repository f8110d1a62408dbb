//! The per-creator crawl state machine.
//!
//! One attempt runs `profile -> paginate -> stats -> persist` strictly in
//! order. Creator identity commits as soon as the profile step resolves;
//! video and snapshot rows land together in one transaction at the end, so a
//! mid-crawl failure never leaves a half-written observation set.

use std::sync::Arc;

use cwatch_platform::{Conditional, ContentItem, PlatformRegistry};

use crate::classify::classify;
use crate::error::CrawlError;
use crate::store::{CrawlStore, CreatorIdentity, VideoObservation};

/// What to crawl and how deep.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub platform: String,
    pub external_id: String,
    /// Maximum number of recent items to fetch, newest first.
    pub depth: u32,
    /// Recorded on the run row; higher dispatches sooner under contention.
    pub priority: i16,
}

/// What one successful attempt accomplished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub videos_found: usize,
    pub snapshots_written: usize,
}

/// Executes crawl attempts against whatever platforms are registered.
pub struct CrawlExecutor {
    store: Arc<dyn CrawlStore>,
    registry: Arc<PlatformRegistry>,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl CrawlExecutor {
    #[must_use]
    pub fn new(
        store: Arc<dyn CrawlStore>,
        registry: Arc<PlatformRegistry>,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Self {
        Self {
            store,
            registry,
            max_retries,
            backoff_base_ms,
        }
    }

    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    #[must_use]
    pub fn backoff_base_ms(&self) -> u64 {
        self.backoff_base_ms
    }

    /// Whether a client is registered for `platform`. Lets the API reject an
    /// enqueue up front instead of queueing a run doomed to fail.
    #[must_use]
    pub fn supports_platform(&self, platform: &str) -> bool {
        self.registry.client_for(platform).is_ok()
    }

    /// Runs a single crawl attempt end to end.
    ///
    /// A not-modified profile still refreshes the creator's `last_seen_at`
    /// and then short-circuits the content walk entirely, returning an empty
    /// summary.
    ///
    /// # Errors
    ///
    /// Any [`CrawlError`]; the caller decides whether to retry via
    /// [`crate::is_retriable`].
    pub async fn crawl_creator(&self, request: &CrawlRequest) -> Result<CrawlSummary, CrawlError> {
        let client = self.registry.client_for(&request.platform)?;

        let profile = client.fetch_creator_profile(&request.external_id).await?;
        let identity = match &profile {
            Conditional::Fresh { value, validator } => CreatorIdentity {
                platform: request.platform.clone(),
                external_id: request.external_id.clone(),
                handle: value.handle.clone(),
                display_name: value.display_name.clone(),
                etag: validator.clone(),
            },
            Conditional::NotModified => CreatorIdentity {
                platform: request.platform.clone(),
                external_id: request.external_id.clone(),
                handle: None,
                display_name: None,
                etag: None,
            },
        };
        let creator_id = self.store.upsert_creator(&identity).await?;

        if profile.is_not_modified() {
            tracing::debug!(
                platform = %request.platform,
                external_id = %request.external_id,
                "profile not modified, skipping content walk"
            );
            return Ok(CrawlSummary::default());
        }

        let items = self.walk_content(client.as_ref(), request).await?;
        if items.is_empty() {
            return Ok(CrawlSummary::default());
        }

        let ids: Vec<String> = items.iter().map(|item| item.external_id.clone()).collect();
        let stats = client.fetch_content_stats(&ids).await?;

        let mut observations = Vec::with_capacity(stats.len());
        for stat in &stats {
            let kind = classify(&stat.title, stat.duration_secs);
            observations.push(VideoObservation {
                external_id: stat.external_id.clone(),
                title: stat.title.clone(),
                description: stat.description.clone(),
                content_kind: kind.as_str(),
                duration_secs: stat.duration_secs,
                published_at: stat.published_at,
                views: stat.views,
                likes: stat.likes,
                comments: stat.comments,
                shares: stat.shares,
            });
        }

        let snapshots_written = self
            .store
            .persist_observations(creator_id, &observations)
            .await?;

        tracing::info!(
            platform = %request.platform,
            external_id = %request.external_id,
            videos_found = observations.len(),
            snapshots_written,
            "crawl attempt complete"
        );

        Ok(CrawlSummary {
            videos_found: observations.len(),
            snapshots_written,
        })
    }

    /// Walks the content listing until `depth` items are collected, the
    /// cursor runs out, or a page reports not-modified.
    #[allow(clippy::cast_possible_truncation)]
    async fn walk_content(
        &self,
        client: &dyn cwatch_platform::PlatformClient,
        request: &CrawlRequest,
    ) -> Result<Vec<ContentItem>, CrawlError> {
        let mut items: Vec<ContentItem> = Vec::new();
        let mut cursor: Option<String> = None;

        while (items.len() as u32) < request.depth {
            let remaining = request.depth - items.len() as u32;
            let page = client
                .fetch_latest_content(&request.external_id, cursor.as_deref(), remaining)
                .await?;
            if page.not_modified {
                break;
            }
            items.extend(page.items);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        items.truncate(request.depth as usize);
        Ok(items)
    }
}
