//! HTTP client for the YouTube Data API v3.
//!
//! Every request passes the token bucket first (one quota unit per call,
//! blocking up to the configured acquisition timeout) and, where the endpoint
//! is cacheable, sends `If-None-Match` with the last stored ETag. A 304
//! response surfaces as [`Conditional::NotModified`] with no body transferred;
//! fresh responses write their ETag back to the cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use cwatch_platform::{
    CommentPage, Conditional, ContentPage, ContentStats, CreatorProfile, KvStore, PlatformClient,
    PlatformError, TokenBucket, ValidatorCache,
};

use crate::normalize::{channel_to_profile, playlist_item_to_content, video_to_stats};
use crate::types::{
    Channel, ChannelListResponse, CommentThreadsResponse, PlaylistItemsResponse, VideoListResponse,
};

pub const PLATFORM: &str = "youtube";

/// Quota bucket key shared by every worker crawling YouTube.
pub const QUOTA_KEY: &str = "yt:units";

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// Listing endpoints accept at most 50 results per page.
const MAX_PAGE_SIZE: u32 = 50;
/// `videos.list` accepts at most 50 ids per call.
const STATS_BATCH_SIZE: usize = 50;
/// `commentThreads.list` accepts at most 100 results per page.
const MAX_COMMENT_PAGE_SIZE: u32 = 100;

pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: Url,
    units: TokenBucket,
    etags: ValidatorCache,
    acquire_timeout: Duration,
}

impl YouTubeClient {
    /// Creates a client pointed at the production Data API.
    ///
    /// `units_per_min` is both the bucket capacity and the per-minute refill,
    /// i.e. the sustained quota budget.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Transport`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        store: Arc<dyn KvStore>,
        api_key: &str,
        units_per_min: u32,
        request_timeout_secs: u64,
        acquire_timeout_secs: u64,
    ) -> Result<Self, PlatformError> {
        Self::with_base_url(
            store,
            api_key,
            units_per_min,
            request_timeout_secs,
            acquire_timeout_secs,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Config`] if `base_url` does not parse, or
    /// [`PlatformError::Transport`] if the HTTP client cannot be constructed.
    pub fn with_base_url(
        store: Arc<dyn KvStore>,
        api_key: &str,
        units_per_min: u32,
        request_timeout_secs: u64,
        acquire_timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("creatorwatch/0.1 (creator-tracking)")
            .build()?;

        // Normalise: a trailing slash keeps endpoint paths appending rather
        // than replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| PlatformError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        let capacity = f64::from(units_per_min);
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            units: TokenBucket::new(Arc::clone(&store), QUOTA_KEY, capacity, capacity / 60.0),
            etags: ValidatorCache::new(store),
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }

    fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("{}{endpoint}", self.base_url.path()));
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", &self.api_key);
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        url
    }

    /// One throttled, optionally cache-conditional GET.
    ///
    /// Charges `unit_cost` against the bucket before the request goes out;
    /// a bucket that stays empty past the acquisition timeout fails fast
    /// with [`PlatformError::QuotaExhausted`] — retry policy lives with the
    /// executor, never here.
    async fn get_json(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        unit_cost: f64,
        etag_key: Option<&str>,
    ) -> Result<Conditional<serde_json::Value>, PlatformError> {
        if !self
            .units
            .acquire(unit_cost, true, self.acquire_timeout)
            .await?
        {
            return Err(PlatformError::QuotaExhausted {
                platform: PLATFORM.to_owned(),
            });
        }

        let url = self.endpoint_url(endpoint, params);
        let mut request = self.client.get(url.clone());
        if let Some(resource) = etag_key {
            if let Some(validator) = self.etags.get(PLATFORM, resource).await? {
                request = request.header("If-None-Match", validator);
            }
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            tracing::debug!(endpoint, "conditional fetch hit, skipping body");
            return Ok(Conditional::NotModified);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(PlatformError::NotFound {
                resource: redacted(&url),
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            // The platform is throttling harder than our own accounting;
            // same classification as a local bucket timeout.
            return Err(PlatformError::QuotaExhausted {
                platform: PLATFORM.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(PlatformError::UnexpectedStatus {
                status: status.as_u16(),
                url: redacted(&url),
            });
        }

        let validator = response
            .headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);

        let value: serde_json::Value = response.json().await?;

        if let (Some(resource), Some(validator)) = (etag_key, validator.as_deref()) {
            self.etags.set(PLATFORM, resource, validator).await?;
        }

        Ok(Conditional::Fresh { value, validator })
    }

    /// Fetches the raw channel resource, conditionally. Shared by the profile
    /// and content-listing paths so both benefit from the same ETag.
    async fn fetch_channel(
        &self,
        external_id: &str,
    ) -> Result<Conditional<Channel>, PlatformError> {
        let etag_key = format!("channels:{external_id}");
        let body = self
            .get_json(
                "channels",
                &[("part", "snippet,contentDetails"), ("id", external_id)],
                1.0,
                Some(&etag_key),
            )
            .await?;

        let Conditional::Fresh { value, validator } = body else {
            return Ok(Conditional::NotModified);
        };

        let parsed: ChannelListResponse =
            serde_json::from_value(value).map_err(|e| PlatformError::Deserialize {
                context: format!("channels.list(id={external_id})"),
                source: e,
            })?;

        let channel = parsed
            .items
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::NotFound {
                resource: format!("channel {external_id}"),
            })?;

        Ok(Conditional::Fresh {
            value: channel,
            validator,
        })
    }
}

#[async_trait]
impl PlatformClient for YouTubeClient {
    fn platform(&self) -> &str {
        PLATFORM
    }

    async fn fetch_creator_profile(
        &self,
        external_id: &str,
    ) -> Result<Conditional<CreatorProfile>, PlatformError> {
        match self.fetch_channel(external_id).await? {
            Conditional::Fresh { value, validator } => Ok(Conditional::Fresh {
                value: channel_to_profile(external_id, &value),
                validator,
            }),
            Conditional::NotModified => Ok(Conditional::NotModified),
        }
    }

    async fn fetch_latest_content(
        &self,
        external_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ContentPage, PlatformError> {
        // The uploads playlist id comes off the channel resource; when the
        // channel itself reports not-modified there is nothing new to page.
        let channel = match self.fetch_channel(external_id).await? {
            Conditional::Fresh { value, .. } => value,
            Conditional::NotModified => return Ok(ContentPage::not_modified()),
        };
        let uploads = channel.content_details.related_playlists.uploads;

        let max_results = page_size.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![
            ("part", "snippet,contentDetails"),
            ("playlistId", uploads.as_str()),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = cursor {
            params.push(("pageToken", token));
        }

        let etag_key = format!("playlist:{uploads}");
        let body = self
            .get_json("playlistItems", &params, 1.0, Some(&etag_key))
            .await?;

        let Conditional::Fresh { value, .. } = body else {
            return Ok(ContentPage::not_modified());
        };

        let parsed: PlaylistItemsResponse =
            serde_json::from_value(value).map_err(|e| PlatformError::Deserialize {
                context: format!("playlistItems.list(playlistId={uploads})"),
                source: e,
            })?;

        Ok(ContentPage {
            items: parsed
                .items
                .into_iter()
                .map(playlist_item_to_content)
                .collect(),
            next_cursor: parsed.next_page_token,
            not_modified: false,
        })
    }

    async fn fetch_content_stats(
        &self,
        external_ids: &[String],
    ) -> Result<Vec<ContentStats>, PlatformError> {
        let mut out = Vec::with_capacity(external_ids.len());

        for chunk in external_ids.chunks(STATS_BATCH_SIZE) {
            let ids = chunk.join(",");
            let body = self
                .get_json(
                    "videos",
                    &[
                        ("part", "snippet,contentDetails,statistics"),
                        ("id", ids.as_str()),
                    ],
                    1.0,
                    None,
                )
                .await?;

            // No ETag key was supplied, so a 304 cannot occur here.
            let Conditional::Fresh { value, .. } = body else {
                continue;
            };

            let parsed: VideoListResponse =
                serde_json::from_value(value).map_err(|e| PlatformError::Deserialize {
                    context: format!("videos.list({} ids)", chunk.len()),
                    source: e,
                })?;

            out.extend(parsed.items.into_iter().map(video_to_stats));
        }

        Ok(out)
    }

    async fn fetch_comments(
        &self,
        content_external_id: &str,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<CommentPage, PlatformError> {
        let max_results = page_size.clamp(1, MAX_COMMENT_PAGE_SIZE).to_string();
        let mut params = vec![
            ("part", "snippet"),
            ("videoId", content_external_id),
            ("maxResults", max_results.as_str()),
            ("order", "time"),
        ];
        if let Some(token) = cursor {
            params.push(("pageToken", token));
        }

        let body = self.get_json("commentThreads", &params, 1.0, None).await?;
        let Conditional::Fresh { value, .. } = body else {
            return Ok(CommentPage {
                items: Vec::new(),
                next_cursor: None,
            });
        };

        let parsed: CommentThreadsResponse =
            serde_json::from_value(value).map_err(|e| PlatformError::Deserialize {
                context: format!("commentThreads.list(videoId={content_external_id})"),
                source: e,
            })?;

        Ok(CommentPage {
            items: parsed
                .items
                .into_iter()
                .map(|thread| {
                    let snippet = thread.snippet.top_level_comment.snippet;
                    cwatch_platform::Comment {
                        external_id: thread.id,
                        author: snippet.author_display_name,
                        text: snippet.text_display,
                        published_at: snippet.published_at,
                    }
                })
                .collect(),
            next_cursor: parsed.next_page_token,
        })
    }
}

/// URL rendered without the API key, for error messages and logs.
fn redacted(url: &Url) -> String {
    let mut safe = url.clone();
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != "key")
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();
    safe.set_query(None);
    {
        let mut query = safe.query_pairs_mut();
        for (name, value) in &retained {
            query.append_pair(name, value);
        }
    }
    safe.to_string()
}
