//! Crawl execution: the per-creator state machine, its retry policy, and the
//! tier fan-out that feeds it.
//!
//! One invocation walks `profile -> paginate -> stats -> upsert` strictly in
//! order, commits creator identity early, and writes all video/snapshot rows
//! in a single transaction. Failures are classified, not caught wholesale:
//! transient ones re-run the whole attempt with backoff, permanent ones fail
//! the run immediately.

pub mod classify;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod retry;
pub mod runner;
pub mod store;

pub use classify::{classify, ContentKind};
pub use dispatch::{dispatch_tier, tier_request};
pub use error::{is_retriable, CrawlError};
pub use executor::{CrawlExecutor, CrawlRequest, CrawlSummary};
pub use retry::retry_with_backoff;
pub use runner::{run_crawl, spawn_crawl};
pub use store::{CrawlStore, CreatorIdentity, PgCrawlStore, VideoObservation};
