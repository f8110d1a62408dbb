//! Platform-agnostic crawl plumbing.
//!
//! Everything a concrete platform client composes: the shared key-value
//! collaborator ([`KvStore`]), the token-bucket limiter, the conditional-fetch
//! validator cache, the normalized content types, and the [`PlatformClient`]
//! capability trait with its registry. Adding a platform means implementing
//! [`PlatformClient`] and registering it — the crawl executor never changes.

pub mod cache;
pub mod client;
pub mod error;
pub mod kv;
pub mod limiter;
pub mod registry;
pub mod types;

pub use cache::ValidatorCache;
pub use client::PlatformClient;
pub use error::{KvError, PlatformError};
pub use kv::{BucketState, KvStore, MemoryKv, TokenGrant};
pub use limiter::TokenBucket;
pub use registry::PlatformRegistry;
pub use types::{
    Comment, CommentPage, Conditional, ContentItem, ContentPage, ContentStats, CreatorProfile,
};
