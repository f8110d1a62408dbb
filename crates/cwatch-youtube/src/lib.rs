//! YouTube Data API v3 implementation of
//! [`PlatformClient`](cwatch_platform::PlatformClient).
//!
//! Wraps `reqwest` with quota accounting (token bucket, one unit per call)
//! and ETag conditional requests, translating Data API payloads into the
//! normalized platform types.

mod client;
mod normalize;
mod types;

pub use client::{YouTubeClient, PLATFORM, QUOTA_KEY};
