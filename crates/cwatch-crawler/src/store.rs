//! Persistence seam between the crawl executor and Postgres.
//!
//! The executor only ever performs two writes: committing a creator's
//! identity (its own statement, durable even if the rest of the crawl dies)
//! and persisting one crawl's video observations atomically. Putting those
//! behind a trait lets executor tests run against an in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cwatch_db::{
    insert_snapshot, upsert_creator, upsert_video, CreatorUpsert, DbError, SnapshotInsert,
    VideoUpsert,
};

/// Identity fields a crawl learned about a creator.
///
/// `None` optionals mean "no fresh value observed this crawl" (a 304 on the
/// profile fetch); the store must keep the previously recorded value.
#[derive(Debug, Clone)]
pub struct CreatorIdentity {
    pub platform: String,
    pub external_id: String,
    pub handle: Option<String>,
    pub display_name: Option<String>,
    pub etag: Option<String>,
}

/// One video as observed in a single crawl: metadata plus the counter values
/// captured at crawl time.
#[derive(Debug, Clone)]
pub struct VideoObservation {
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub content_kind: &'static str,
    pub duration_secs: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
}

/// Writes performed by a crawl attempt.
#[async_trait]
pub trait CrawlStore: Send + Sync {
    /// Commits creator identity and returns the creator's row id.
    ///
    /// Committed independently of the observation transaction so a creator
    /// stays tracked even when the content walk fails.
    async fn upsert_creator(&self, identity: &CreatorIdentity) -> Result<i64, DbError>;

    /// Persists all of one crawl's observations atomically: each video is
    /// upserted and gets exactly one appended snapshot. Returns the number of
    /// snapshots written.
    async fn persist_observations(
        &self,
        creator_id: i64,
        observations: &[VideoObservation],
    ) -> Result<usize, DbError>;
}

/// The production store, backed by the shared connection pool.
#[derive(Debug, Clone)]
pub struct PgCrawlStore {
    pool: PgPool,
}

impl PgCrawlStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CrawlStore for PgCrawlStore {
    async fn upsert_creator(&self, identity: &CreatorIdentity) -> Result<i64, DbError> {
        let row = upsert_creator(
            &self.pool,
            &CreatorUpsert {
                platform: &identity.platform,
                external_id: &identity.external_id,
                handle: identity.handle.as_deref(),
                display_name: identity.display_name.as_deref(),
                last_etag: identity.etag.as_deref(),
            },
        )
        .await?;
        Ok(row.id)
    }

    async fn persist_observations(
        &self,
        creator_id: i64,
        observations: &[VideoObservation],
    ) -> Result<usize, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0usize;
        for obs in observations {
            let video = upsert_video(
                &mut *tx,
                &VideoUpsert {
                    creator_id,
                    external_id: &obs.external_id,
                    title: &obs.title,
                    description: &obs.description,
                    content_kind: obs.content_kind,
                    duration_secs: obs.duration_secs,
                    published_at: obs.published_at,
                },
            )
            .await?;
            insert_snapshot(
                &mut *tx,
                &SnapshotInsert {
                    video_id: video.id,
                    views: obs.views,
                    likes: obs.likes,
                    comments: obs.comments,
                    shares: obs.shares,
                },
            )
            .await?;
            written += 1;
        }
        tx.commit().await?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn identity() -> CreatorIdentity {
        CreatorIdentity {
            platform: "youtube".to_owned(),
            external_id: "UC-idem".to_owned(),
            handle: Some("@idem".to_owned()),
            display_name: Some("Idem Creator".to_owned()),
            etag: Some("W/\"tag-1\"".to_owned()),
        }
    }

    fn observation(title: &str) -> VideoObservation {
        VideoObservation {
            external_id: "vid-idem".to_owned(),
            title: title.to_owned(),
            description: "desc".to_owned(),
            content_kind: "video",
            duration_secs: 300,
            published_at: Some(Utc::now()),
            views: 1_000,
            likes: 50,
            comments: 10,
            shares: 0,
        }
    }

    async fn count(pool: &PgPool, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .expect("count query")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn repeat_crawl_shares_rows_and_appends_snapshots(pool: PgPool) {
        let store = PgCrawlStore::new(pool.clone());

        let first_id = store.upsert_creator(&identity()).await.expect("upsert 1");
        let second_id = store.upsert_creator(&identity()).await.expect("upsert 2");
        assert_eq!(first_id, second_id);
        assert_eq!(count(&pool, "creators").await, 1);

        let written = store
            .persist_observations(first_id, &[observation("Original title")])
            .await
            .expect("persist 1");
        assert_eq!(written, 1);
        let written = store
            .persist_observations(first_id, &[observation("Updated title")])
            .await
            .expect("persist 2");
        assert_eq!(written, 1);

        assert_eq!(count(&pool, "videos").await, 1);
        assert_eq!(count(&pool, "stats_snapshots").await, 2);

        // The conflict path took the freshly observed metadata.
        let title: String = sqlx::query_scalar(
            "SELECT title FROM videos WHERE creator_id = $1 AND external_id = 'vid-idem'",
        )
        .bind(first_id)
        .fetch_one(&pool)
        .await
        .expect("video title");
        assert_eq!(title, "Updated title");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn not_modified_upsert_keeps_stored_identity(pool: PgPool) {
        let store = PgCrawlStore::new(pool.clone());
        let id = store.upsert_creator(&identity()).await.expect("fresh upsert");

        // A 304 crawl observes nothing new; stored fields must survive.
        let bare = CreatorIdentity {
            platform: "youtube".to_owned(),
            external_id: "UC-idem".to_owned(),
            handle: None,
            display_name: None,
            etag: None,
        };
        let same_id = store.upsert_creator(&bare).await.expect("bare upsert");
        assert_eq!(id, same_id);

        let (handle, etag): (Option<String>, Option<String>) = sqlx::query_as(
            "SELECT handle, last_etag FROM creators WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&pool)
        .await
        .expect("creator row");
        assert_eq!(handle.as_deref(), Some("@idem"));
        assert_eq!(etag.as_deref(), Some("W/\"tag-1\""));
    }
}
