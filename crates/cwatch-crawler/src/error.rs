use cwatch_db::DbError;
use cwatch_platform::PlatformError;
use thiserror::Error;

/// One crawl attempt's failure, classified by origin.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Returns `true` if `err` represents a transient condition worth retrying
/// after a backoff delay.
///
/// **Retriable:**
/// - [`PlatformError::QuotaExhausted`] — the quota window refills over time.
/// - [`PlatformError::Transport`] — network-level failure.
/// - [`PlatformError::UnexpectedStatus`] with a 5xx status.
/// - [`PlatformError::Kv`] — the shared store hiccuped.
/// - [`DbError::Sqlx`] / [`DbError::Migration`] — the attempt's transaction
///   was rolled back whole, so a re-run starts clean.
///
/// **Not retriable (hard stop):**
/// - [`PlatformError::NotFound`] — a permanently invalid external id;
///   retrying would return the same answer and burn quota.
/// - [`PlatformError::UnexpectedStatus`] with a 4xx status.
/// - [`PlatformError::Deserialize`] — malformed response; retrying won't fix it.
/// - [`PlatformError::UnsupportedPlatform`] / [`PlatformError::Config`] —
///   composition problems, not runtime weather.
/// - [`DbError::NotFound`] / [`DbError::InvalidCrawlRunTransition`] — the row
///   is gone or another driver owns it; a retry gets the same answer.
#[must_use]
pub fn is_retriable(err: &CrawlError) -> bool {
    match err {
        CrawlError::Platform(platform_err) => match platform_err {
            PlatformError::QuotaExhausted { .. }
            | PlatformError::Transport(_)
            | PlatformError::Kv(_) => true,
            PlatformError::UnexpectedStatus { status, .. } => *status >= 500,
            PlatformError::NotFound { .. }
            | PlatformError::Deserialize { .. }
            | PlatformError::UnsupportedPlatform(_)
            | PlatformError::Config(_) => false,
        },
        CrawlError::Db(db_err) => {
            matches!(db_err, DbError::Sqlx(_) | DbError::Migration(_))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_exhaustion_is_retriable() {
        let err = CrawlError::Platform(PlatformError::QuotaExhausted {
            platform: "youtube".to_owned(),
        });
        assert!(is_retriable(&err));
    }

    #[test]
    fn not_found_is_permanent() {
        let err = CrawlError::Platform(PlatformError::NotFound {
            resource: "channel UC-gone".to_owned(),
        });
        assert!(!is_retriable(&err));
    }

    #[test]
    fn server_errors_retry_but_client_errors_do_not() {
        let mk = |status| {
            CrawlError::Platform(PlatformError::UnexpectedStatus {
                status,
                url: "https://example.com/channels".to_owned(),
            })
        };
        assert!(is_retriable(&mk(503)));
        assert!(!is_retriable(&mk(400)));
        assert!(!is_retriable(&mk(403)));
    }

    #[test]
    fn unsupported_platform_is_permanent() {
        let err = CrawlError::Platform(PlatformError::UnsupportedPlatform(
            "vine".to_owned(),
        ));
        assert!(!is_retriable(&err));
    }

    #[test]
    fn transient_db_errors_retry_but_state_conflicts_do_not() {
        assert!(is_retriable(&CrawlError::Db(DbError::Sqlx(
            sqlx::Error::PoolTimedOut
        ))));
        assert!(!is_retriable(&CrawlError::Db(DbError::NotFound)));
        assert!(!is_retriable(&CrawlError::Db(
            DbError::InvalidCrawlRunTransition {
                id: 1,
                expected_status: "queued",
            }
        )));
    }
}
