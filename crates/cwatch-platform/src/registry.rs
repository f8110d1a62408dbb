//! Platform lookup: identifier → client.
//!
//! Replaces per-call `if platform == ...` dispatch. The executor asks the
//! registry; adding a platform is one `register` call at composition time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::PlatformClient;
use crate::error::PlatformError;

#[derive(Default)]
pub struct PlatformRegistry {
    clients: HashMap<String, Arc<dyn PlatformClient>>,
}

impl PlatformRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `client` under its own platform identifier, replacing any
    /// previous registration for that platform.
    pub fn register(&mut self, client: Arc<dyn PlatformClient>) {
        self.clients.insert(client.platform().to_owned(), client);
    }

    /// Looks up the client for `platform`.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::UnsupportedPlatform`] when no client is
    /// registered — a permanent error, never retried.
    pub fn client_for(&self, platform: &str) -> Result<Arc<dyn PlatformClient>, PlatformError> {
        self.clients
            .get(platform)
            .cloned()
            .ok_or_else(|| PlatformError::UnsupportedPlatform(platform.to_owned()))
    }

    /// Registered platform identifiers, for the metrics surface.
    #[must_use]
    pub fn platforms(&self) -> Vec<&str> {
        self.clients.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommentPage, Conditional, ContentPage, ContentStats, CreatorProfile};
    use async_trait::async_trait;

    impl std::fmt::Debug for dyn PlatformClient {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("PlatformClient")
                .field("platform", &self.platform())
                .finish()
        }
    }

    struct NullClient;

    #[async_trait]
    impl PlatformClient for NullClient {
        fn platform(&self) -> &str {
            "nulltube"
        }

        async fn fetch_creator_profile(
            &self,
            _external_id: &str,
        ) -> Result<Conditional<CreatorProfile>, PlatformError> {
            Ok(Conditional::NotModified)
        }

        async fn fetch_latest_content(
            &self,
            _external_id: &str,
            _cursor: Option<&str>,
            _page_size: u32,
        ) -> Result<ContentPage, PlatformError> {
            Ok(ContentPage::not_modified())
        }

        async fn fetch_content_stats(
            &self,
            _external_ids: &[String],
        ) -> Result<Vec<ContentStats>, PlatformError> {
            Ok(Vec::new())
        }

        async fn fetch_comments(
            &self,
            _content_external_id: &str,
            _cursor: Option<&str>,
            _page_size: u32,
        ) -> Result<CommentPage, PlatformError> {
            Ok(CommentPage {
                items: Vec::new(),
                next_cursor: None,
            })
        }
    }

    #[test]
    fn lookup_finds_registered_client() {
        let mut registry = PlatformRegistry::new();
        registry.register(Arc::new(NullClient));
        let client = registry.client_for("nulltube").unwrap();
        assert_eq!(client.platform(), "nulltube");
    }

    #[test]
    fn unknown_platform_is_unsupported() {
        let registry = PlatformRegistry::new();
        let err = registry.client_for("myspace").unwrap_err();
        assert!(matches!(err, PlatformError::UnsupportedPlatform(ref p) if p == "myspace"));
    }
}
