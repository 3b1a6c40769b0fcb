//! Client configuration.
//!
//! [`HalConfiguration`] is the one-time configuration handed to
//! [`HalClient::new`](crate::HalClient::new): the base API URL everything is
//! resolved against, the observability switch, the transport timeout, and the
//! response-cache bounds.
//!
//! # Examples
//!
//! ```
//! use hal_client::{CacheSettings, HalConfiguration};
//!
//! let config = HalConfiguration {
//!     base_api_url: "http://localhost:8080/api/v1".to_string(),
//!     verbose_logs: true,
//!     cache: CacheSettings {
//!         ttl_ms: Some(30_000),
//!         max_entries: Some(512),
//!     },
//!     ..Default::default()
//! };
//! assert_eq!(config.request_timeout_ms, 30_000);
//! ```

use std::time::Duration;

/// Bounds applied to the response cache.
///
/// Both bounds are optional. With the defaults the cache is unbounded and
/// entries live until an explicit invalidation or clear; production
/// deployments should set both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheSettings {
    /// Time-to-live for resolved entries, in milliseconds. Expired entries
    /// are dropped lazily on the next read of their key.
    pub ttl_ms: Option<u64>,
    /// Maximum number of resolved entries. When exceeded, least-recently-used
    /// resolved entries are evicted; pending entries are never evicted.
    pub max_entries: Option<usize>,
}

impl CacheSettings {
    /// TTL as a [`Duration`], if one is configured.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }
}

/// Library configuration, applied once when constructing a
/// [`HalClient`](crate::HalClient).
#[derive(Debug, Clone, PartialEq)]
pub struct HalConfiguration {
    /// Base URL of the HAL API; all resource URLs are built under it.
    pub base_api_url: String,
    /// Emit request/response logs through `tracing`. Logging is side-effect
    /// only and never affects control flow.
    pub verbose_logs: bool,
    /// Transport timeout in milliseconds. Expiry surfaces as a
    /// [`RequestFailed`](crate::HalError::RequestFailed) error.
    pub request_timeout_ms: u64,
    /// Response cache bounds.
    pub cache: CacheSettings,
}

impl HalConfiguration {
    /// Configuration for the given base API URL with default settings.
    pub fn new(base_api_url: impl Into<String>) -> Self {
        HalConfiguration {
            base_api_url: base_api_url.into(),
            ..Default::default()
        }
    }

    /// Enable verbose request/response logging.
    pub fn with_verbose_logs(mut self, enabled: bool) -> Self {
        self.verbose_logs = enabled;
        self
    }

    /// Override the transport timeout.
    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    /// Override the cache bounds.
    pub fn with_cache(mut self, cache: CacheSettings) -> Self {
        self.cache = cache;
        self
    }

    /// Transport timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for HalConfiguration {
    fn default() -> Self {
        HalConfiguration {
            base_api_url: String::new(),
            verbose_logs: false,
            request_timeout_ms: 30_000,
            cache: CacheSettings::default(),
        }
    }
}
