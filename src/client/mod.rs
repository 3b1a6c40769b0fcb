//! HTTP client: transport, caching executor and the high-level dispatcher.
//!
//! This module turns validated requests into hydrated HAL resources:
//!
//! - **Build resource URLs** from one configured base API URL
//! - **Cache `GET` responses** with in-flight request coalescing
//! - **Invalidate related entries** after `POST`/`PUT`/`PATCH`
//! - **Reject bad requests early**, before anything reaches the wire
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── transport - Transport trait and the reqwest implementation
//! ├── cache     - response cache with single-flight semantics
//! ├── executor  - method policy, cache routing, response decoding
//! └── dispatch  - HalClient: validation, URL building, typed accessors
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HalClient`] | High-level HAL+JSON client |
//! | [`HttpExecutor`] | Method routing over transport and cache |
//! | [`ResponseCache`] | Hydrated-response cache keyed by request identity |
//! | [`CacheKey`] | Method, URL, query and body identity of a request |
//! | [`Transport`] | Seam for substituting the wire layer |
//!
//! # Examples
//!
//! ## Creating a client
//!
//! ```
//! use hal_client::{HalClient, HalConfiguration, CacheSettings};
//!
//! let config = HalConfiguration::new("http://localhost:8080/api")
//!     .with_verbose_logs(true)
//!     .with_cache(CacheSettings {
//!         ttl_ms: Some(30_000),
//!         max_entries: Some(512),
//!     });
//! let client = HalClient::new(config).unwrap();
//! ```
//!
//! ## Request identity
//!
//! ```
//! use hal_client::{CacheKey, HttpMethod};
//!
//! let params = vec![("size".to_string(), "20".to_string())];
//! let a = CacheKey::new(HttpMethod::Get, "http://h/api/orders", &params, None);
//! let b = CacheKey::new(HttpMethod::Get, "http://h/api/orders", &params, None);
//! assert_eq!(a, b);
//! ```

pub mod cache;
pub mod dispatch;
pub mod executor;
pub mod transport;

pub use cache::{CacheKey, ResponseCache};
pub use dispatch::HalClient;
pub use executor::HttpExecutor;
pub use transport::{ReqwestTransport, Transport, TransportResponse};
