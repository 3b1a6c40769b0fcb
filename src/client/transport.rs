//! Wire transport abstraction.
//!
//! [`Transport`] is the seam between the HTTP executor and the network.
//! The stock implementation is [`ReqwestTransport`]; tests substitute their
//! own to exercise the caching and dispatch layers without sockets.
//!
//! A transport only moves bytes: it resolves nothing, caches nothing and
//! treats every status code as a valid answer. Turning non-2xx responses
//! into errors is the executor's job, so the executor can attach the
//! request context it alone knows.

use crate::config::HalConfiguration;
use crate::error::{HalError, Result};
use crate::types::HttpMethod;
use crate::url::Params;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

/// Raw response handed back by a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Unparsed response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one HTTP request and returns the raw response.
///
/// Implementations must be safe to share across tasks; the executor holds
/// one behind an `Arc` for the lifetime of the client. Network-level
/// failures map to [`HalError::RequestFailed`] with no status code.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform `method` on `url` with query `params` and an optional JSON
    /// `body`.
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<TransportResponse>;
}

/// [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport honoring the configured request timeout.
    pub fn new(config: &HalConfiguration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_default();
        ReqwestTransport { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        params: &Params,
        body: Option<&Value>,
    ) -> Result<TransportResponse> {
        let mut builder = self.client.request(to_reqwest(method), url);
        if !params.is_empty() {
            builder = builder.query(params);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| HalError::RequestFailed {
            method: method.to_string(),
            url: url.to_string(),
            status: None,
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| HalError::RequestFailed {
            method: method.to_string(),
            url: url.to_string(),
            status: Some(status),
            reason: format!("failed to read response body: {e}"),
        })?;

        Ok(TransportResponse { status, body })
    }
}

fn to_reqwest(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted transport for exercising the layers above without sockets.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// What the executor actually asked the transport to do.
    #[derive(Debug, Clone)]
    pub(crate) struct RecordedCall {
        pub method: HttpMethod,
        pub url: String,
        pub params: Params,
        pub body: Option<Value>,
    }

    /// Transport that replays a queue of canned responses and records every
    /// call. With an empty queue it answers `200 {}`.
    pub(crate) struct MockTransport {
        responses: Mutex<VecDeque<Result<TransportResponse>>>,
        calls: AtomicUsize,
        last: Mutex<Option<RecordedCall>>,
    }

    impl MockTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(MockTransport {
                responses: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }

        pub fn push_json(&self, status: u16, body: &Value) {
            let bytes = Bytes::from(body.to_string());
            self.responses
                .lock()
                .push_back(Ok(TransportResponse { status, body: bytes }));
        }

        pub fn push_raw(&self, status: u16, body: &'static str) {
            self.responses.lock().push_back(Ok(TransportResponse {
                status,
                body: Bytes::from_static(body.as_bytes()),
            }));
        }

        pub fn push_error(&self, error: HalError) {
            self.responses.lock().push_back(Err(error));
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_call(&self) -> Option<RecordedCall> {
            self.last.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(
            &self,
            method: HttpMethod,
            url: &str,
            params: &Params,
            body: Option<&Value>,
        ) -> Result<TransportResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock() = Some(RecordedCall {
                method,
                url: url.to_string(),
                params: params.clone(),
                body: body.cloned(),
            });
            self.responses.lock().pop_front().unwrap_or_else(|| {
                Ok(TransportResponse {
                    status: 200,
                    body: Bytes::from_static(b"{}"),
                })
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let ok = TransportResponse {
            status: 204,
            body: Bytes::new(),
        };
        assert!(ok.is_success());
        let not_found = TransportResponse {
            status: 404,
            body: Bytes::new(),
        };
        assert!(!not_found.is_success());
    }

    #[test]
    fn test_transport_builds_from_config() {
        let config = HalConfiguration::new("http://localhost/api");
        let _transport = ReqwestTransport::new(&config);
    }

    #[tokio::test]
    async fn test_mock_records_calls() {
        let mock = mock::MockTransport::new();
        mock.push_json(200, &serde_json::json!({"ok": true}));

        let response = mock
            .send(HttpMethod::Get, "http://h/api/orders", &Vec::new(), None)
            .await
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_call().unwrap().url, "http://h/api/orders");
    }
}
