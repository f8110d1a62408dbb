//! Database operations for the `stats_snapshots` table.
//!
//! Snapshots are append-only: every crawl that observes a video writes a new
//! row and nothing ever mutates an existing one. That is the time series.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// A row from the `stats_snapshots` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: i64,
    pub video_id: i64,
    pub captured_at: DateTime<Utc>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

/// Counter values captured in one crawl.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotInsert {
    pub video_id: i64,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

/// Appends one snapshot; runs inside the crawl's transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_snapshot(
    conn: &mut PgConnection,
    insert: &SnapshotInsert,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO stats_snapshots (video_id, views, likes, comments, shares) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id",
    )
    .bind(insert.video_id)
    .bind(insert.views)
    .bind(insert.likes)
    .bind(insert.comments)
    .bind(insert.shares)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// The most recent snapshot for a video, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_snapshot(pool: &PgPool, video_id: i64) -> Result<Option<SnapshotRow>, DbError> {
    let row = sqlx::query_as::<_, SnapshotRow>(
        "SELECT id, video_id, captured_at, views, likes, comments, shares \
         FROM stats_snapshots \
         WHERE video_id = $1 \
         ORDER BY captured_at DESC, id DESC \
         LIMIT 1",
    )
    .bind(video_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
