//! HTTP execution layer.
//!
//! [`HttpExecutor`] sits between the dispatcher and the [`Transport`]: it
//! enforces the method policy, applies the caching rules and decodes
//! response bodies into [`Hydrated`] values.
//!
//! Caching policy:
//!
//! - `GET` goes through the [`ResponseCache`]; concurrent identical reads
//!   share one request and a reader never sees a request fire for a fresh
//!   cached entry. A body passed with a `GET` is ignored and does not
//!   reach the wire.
//! - `POST`/`PUT`/`PATCH` always hit the transport; once the server
//!   answers 2xx, cached entries related to the written URL are dropped
//!   before the echoed body is decoded. A write the server accepted stales
//!   the cache even when its echo turns out malformed.
//! - `DELETE` and anything else is rejected up front with
//!   [`HalError::UnsupportedMethod`].
//!
//! Decoding: a non-2xx status becomes [`HalError::RequestFailed`] carrying
//! the status and a body snippet; an empty 2xx body hydrates as raw JSON
//! null; a 2xx body that is not JSON is a request failure, not a hydration
//! failure, since the server broke the media-type contract.

use crate::client::cache::{CacheKey, ResponseCache};
use crate::client::transport::{Transport, TransportResponse};
use crate::config::HalConfiguration;
use crate::error::{HalError, Result};
use crate::resource::{hydrate, Hydrated};
use crate::types::HttpMethod;
use crate::url::Params;
use serde_json::Value;
use std::sync::Arc;

/// Executes HTTP methods against a transport with response caching.
pub struct HttpExecutor {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    config: Arc<HalConfiguration>,
}

impl HttpExecutor {
    /// Build an executor over `transport`, with a cache sized per the
    /// configuration.
    pub fn new(transport: Arc<dyn Transport>, config: Arc<HalConfiguration>) -> Self {
        let cache = ResponseCache::new(config.cache.clone());
        HttpExecutor {
            transport,
            cache,
            config,
        }
    }

    /// Perform `method` on `url` and hydrate the response.
    pub async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<Hydrated> {
        if !method.is_allowed() {
            return Err(HalError::UnsupportedMethod(method.to_string()));
        }
        tracing::debug!(method = %method, url, "dispatching request");

        if method.is_cacheable() {
            let key = CacheKey::new(method, url, params, None);
            let transport = Arc::clone(&self.transport);
            let owned_url = url.to_string();
            let owned_params = params.clone();
            return self
                .cache
                .get_or_compute(key, move || {
                    Self::round_trip(transport, method, owned_url, owned_params, None)
                })
                .await;
        }

        let response = Self::perform(self.transport.as_ref(), method, url, params, body).await?;
        // A 2xx means the server applied the write, so related reads are
        // stale no matter what the echoed body looks like.
        self.cache.invalidate_related(url);
        decode_response(method, url, response)
    }

    /// `GET` with caching.
    pub async fn get(&self, url: &str, params: &Params) -> Result<Hydrated> {
        self.execute(HttpMethod::Get, url, params, None).await
    }

    /// `POST`, bypassing and invalidating the cache.
    pub async fn post(&self, url: &str, params: &Params, body: Option<&Value>) -> Result<Hydrated> {
        self.execute(HttpMethod::Post, url, params, body).await
    }

    /// `PUT`, bypassing and invalidating the cache.
    pub async fn put(&self, url: &str, params: &Params, body: Option<&Value>) -> Result<Hydrated> {
        self.execute(HttpMethod::Put, url, params, body).await
    }

    /// `PATCH`, bypassing and invalidating the cache.
    pub async fn patch(
        &self,
        url: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<Hydrated> {
        self.execute(HttpMethod::Patch, url, params, body).await
    }

    /// The response cache, for explicit invalidation.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// The configuration this executor runs under.
    pub fn config(&self) -> &HalConfiguration {
        &self.config
    }

    async fn round_trip(
        transport: Arc<dyn Transport>,
        method: HttpMethod,
        url: String,
        params: Params,
        body: Option<Value>,
    ) -> Result<Hydrated> {
        let response =
            Self::perform(transport.as_ref(), method, &url, &params, body.as_ref()).await?;
        decode_response(method, &url, response)
    }

    /// Send the request and check the status; the body is not decoded yet.
    async fn perform(
        transport: &dyn Transport,
        method: HttpMethod,
        url: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<TransportResponse> {
        let response = transport.send(method, url, params, body).await?;
        if !response.is_success() {
            return Err(HalError::RequestFailed {
                method: method.to_string(),
                url: url.to_string(),
                status: Some(response.status),
                reason: failure_reason(response.status, &response.body),
            });
        }
        Ok(response)
    }
}

/// Decode a successful response body into a hydrated value.
fn decode_response(method: HttpMethod, url: &str, response: TransportResponse) -> Result<Hydrated> {
    if response.body.is_empty() {
        return Ok(Hydrated::Raw(Value::Null));
    }
    let payload: Value =
        serde_json::from_slice(&response.body).map_err(|e| HalError::RequestFailed {
            method: method.to_string(),
            url: url.to_string(),
            status: Some(response.status),
            reason: format!("response body is not valid JSON: {e}"),
        })?;
    hydrate(payload).map_err(HalError::from)
}

/// Status line plus a bounded body snippet for non-2xx responses.
fn failure_reason(status: u16, body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }
    let mut snippet: String = trimmed.chars().take(200).collect();
    if trimmed.chars().count() > 200 {
        snippet.push_str("...");
    }
    format!("HTTP {status}: {snippet}")
}
