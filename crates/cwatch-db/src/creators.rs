//! Database operations for the `creators` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `creators` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CreatorRow {
    pub id: i64,
    pub public_id: Uuid,
    pub platform: String,
    pub external_id: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub tier: i16,
    pub last_etag: Option<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written on every crawl's creator upsert.
///
/// `None` values leave the stored column untouched — a not-modified profile
/// still refreshes `last_seen_at` without clobbering identity fields.
#[derive(Debug, Clone, Copy)]
pub struct CreatorUpsert<'a> {
    pub platform: &'a str,
    pub external_id: &'a str,
    pub handle: Option<&'a str>,
    pub display_name: Option<&'a str>,
    pub last_etag: Option<&'a str>,
}

const CREATOR_COLUMNS: &str = "id, public_id, platform, external_id, handle, display_name, \
                               tier, last_etag, last_seen_at, created_at, updated_at";

/// Inserts or updates a creator by its `(platform, external_id)` natural key.
///
/// Inserts get a fresh `public_id` and the default tier; updates refresh
/// handle/display name/etag only when a new value is present.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_creator(
    pool: &PgPool,
    upsert: &CreatorUpsert<'_>,
) -> Result<CreatorRow, DbError> {
    let row = sqlx::query_as::<_, CreatorRow>(&format!(
        "INSERT INTO creators (public_id, platform, external_id, handle, display_name, last_seen_at) \
         VALUES ($1, $2, $3, $4, $5, NOW()) \
         ON CONFLICT (platform, external_id) DO UPDATE SET \
             handle = COALESCE(EXCLUDED.handle, creators.handle), \
             display_name = COALESCE(EXCLUDED.display_name, creators.display_name), \
             last_etag = COALESCE($6, creators.last_etag), \
             last_seen_at = NOW(), \
             updated_at = NOW() \
         RETURNING {CREATOR_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(upsert.platform)
    .bind(upsert.external_id)
    .bind(upsert.handle)
    .bind(upsert.display_name)
    .bind(upsert.last_etag)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns a creator by its natural key, or `None` if untracked.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_creator(
    pool: &PgPool,
    platform: &str,
    external_id: &str,
) -> Result<Option<CreatorRow>, DbError> {
    let row = sqlx::query_as::<_, CreatorRow>(&format!(
        "SELECT {CREATOR_COLUMNS} FROM creators WHERE platform = $1 AND external_id = $2"
    ))
    .bind(platform)
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns all creators assigned to `tier`, oldest-seen first so the
/// stalest creators go out at the front of a tier batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_creators_in_tier(pool: &PgPool, tier: i16) -> Result<Vec<CreatorRow>, DbError> {
    let rows = sqlx::query_as::<_, CreatorRow>(&format!(
        "SELECT {CREATOR_COLUMNS} FROM creators \
         WHERE tier = $1 \
         ORDER BY last_seen_at ASC NULLS FIRST, id"
    ))
    .bind(tier)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Reassigns a creator's crawl tier.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such creator exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_creator_tier(
    pool: &PgPool,
    platform: &str,
    external_id: &str,
    tier: i16,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE creators SET tier = $1, updated_at = NOW() \
         WHERE platform = $2 AND external_id = $3",
    )
    .bind(tier)
    .bind(platform)
    .bind(external_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
