//! Normalized, platform-independent content types.
//!
//! Concrete clients translate their native payloads into these; the crawl
//! executor and persistence layer never see platform-specific shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a cache-conditional fetch.
///
/// `NotModified` is the 304 short-circuit: the resource has not changed since
/// the cached validator, no body was transferred, and the caller is expected
/// to stop early rather than treat it as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditional<T> {
    Fresh {
        value: T,
        validator: Option<String>,
    },
    NotModified,
}

impl<T> Conditional<T> {
    #[must_use]
    pub fn is_not_modified(&self) -> bool {
        matches!(self, Conditional::NotModified)
    }
}

/// A creator's identity as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorProfile {
    pub external_id: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
}

/// One entry from a creator's content listing. Listing payloads are shallow;
/// full metadata and counters arrive later via the stats batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub external_id: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// One page of a content listing walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPage {
    pub items: Vec<ContentItem>,
    pub next_cursor: Option<String>,
    /// Set when the underlying conditional fetch reported 304. The caller
    /// must treat this as "no new pages" and stop paginating.
    pub not_modified: bool,
}

impl ContentPage {
    /// The page a client returns on a 304: empty, cursorless, flagged.
    #[must_use]
    pub fn not_modified() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            not_modified: true,
        }
    }
}

/// Full metadata plus engagement counters for one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStats {
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub duration_secs: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    /// Zero when the platform does not expose share counts.
    pub shares: i64,
}

/// A single comment on a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub external_id: String,
    pub author: Option<String>,
    pub text: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// One page of a comment listing walk. Never cache-conditional — comment
/// freshness is the point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPage {
    pub items: Vec<Comment>,
    pub next_cursor: Option<String>,
}
