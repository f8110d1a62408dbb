//! Database operations for the `videos` table.
//!
//! Video upserts run inside the crawl's single transaction, so these
//! functions take a `PgConnection` rather than the pool.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::DbError;

/// A row from the `videos` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VideoRow {
    pub id: i64,
    pub creator_id: i64,
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub content_kind: String,
    pub duration_secs: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable fields written on every re-crawl that observes the video.
#[derive(Debug, Clone, Copy)]
pub struct VideoUpsert<'a> {
    pub creator_id: i64,
    pub external_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub content_kind: &'a str,
    pub duration_secs: i32,
    pub published_at: Option<DateTime<Utc>>,
}

/// Inserts or updates a video by `(creator_id, external_id)`.
///
/// Mutable metadata (title, description, kind, duration) always takes the
/// freshly observed value; there is no deletion path.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_video(
    conn: &mut PgConnection,
    upsert: &VideoUpsert<'_>,
) -> Result<VideoRow, DbError> {
    let row = sqlx::query_as::<_, VideoRow>(
        "INSERT INTO videos \
             (creator_id, external_id, title, description, content_kind, duration_secs, published_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (creator_id, external_id) DO UPDATE SET \
             title = EXCLUDED.title, \
             description = EXCLUDED.description, \
             content_kind = EXCLUDED.content_kind, \
             duration_secs = EXCLUDED.duration_secs, \
             published_at = COALESCE(EXCLUDED.published_at, videos.published_at), \
             updated_at = NOW() \
         RETURNING id, creator_id, external_id, title, description, content_kind, \
                   duration_secs, published_at, created_at, updated_at",
    )
    .bind(upsert.creator_id)
    .bind(upsert.external_id)
    .bind(upsert.title)
    .bind(upsert.description)
    .bind(upsert.content_kind)
    .bind(upsert.duration_secs)
    .bind(upsert.published_at)
    .fetch_one(conn)
    .await?;

    Ok(row)
}
