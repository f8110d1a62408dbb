use thiserror::Error;

/// Failures from the shared key-value collaborator.
///
/// The in-memory store never produces these; a networked backend surfaces
/// connectivity problems through this type.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by platform clients and the registry.
///
/// Classification matters more than the message: the crawl executor maps each
/// variant to retry / abort-run / abort-permanently.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The token bucket stayed empty past the acquisition timeout. Retryable —
    /// the quota window refills over time.
    #[error("quota exhausted for platform {platform}")]
    QuotaExhausted { platform: String },

    /// Network or TLS failure from the underlying HTTP client. Retryable.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx, non-304 response. 5xx is treated as transient by the
    /// executor; 4xx is not.
    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The platform says the resource does not exist. Permanent — retrying
    /// an invalid external id only burns quota.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// The response body does not match the expected shape. Permanent.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// No client is registered for the requested platform. Permanent.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Client misconfiguration caught at construction (bad base URL).
    /// Permanent.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The limiter or cache could not reach its backing store.
    #[error(transparent)]
    Kv(#[from] KvError),
}
