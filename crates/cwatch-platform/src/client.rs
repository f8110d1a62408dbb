//! The capability contract every platform integration implements.

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::types::{CommentPage, Conditional, ContentPage, ContentStats, CreatorProfile};

/// One external content platform, behind quota and cache discipline.
///
/// Implementations own their token bucket and validator cache; callers only
/// express crawl intent. Every operation may fail with
/// [`PlatformError::QuotaExhausted`] when the bucket stays empty past the
/// acquisition timeout — implementations fail fast on that and never retry
/// internally. Retries belong to the crawl executor.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Stable platform identifier, e.g. `"youtube"`. Registry key and the
    /// value persisted on creators.
    fn platform(&self) -> &str;

    /// Fetches the creator's profile. One throttled, cache-conditional
    /// request at fixed unit cost.
    async fn fetch_creator_profile(
        &self,
        external_id: &str,
    ) -> Result<Conditional<CreatorProfile>, PlatformError>;

    /// Fetches one page of the creator's latest content, newest first.
    ///
    /// Page size is capped at the platform maximum. When the underlying
    /// profile fetch reports not-modified, returns
    /// [`ContentPage::not_modified`] — the caller stops paginating. This is
    /// the primary API-call reduction mechanism.
    async fn fetch_latest_content(
        &self,
        external_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ContentPage, PlatformError>;

    /// Batch-fetches metadata and counters for arbitrarily many ids,
    /// internally chunked to the platform maximum per call. Result order is
    /// unspecified; match by `external_id`.
    async fn fetch_content_stats(
        &self,
        external_ids: &[String],
    ) -> Result<Vec<ContentStats>, PlatformError>;

    /// Fetches one page of comments for a content item. Throttled but never
    /// cache-conditional.
    async fn fetch_comments(
        &self,
        content_external_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<CommentPage, PlatformError>;
}
