//! Error types and result handling.
//!
//! The crate surfaces two error layers:
//!
//! - [`HalError`]: the crate-wide taxonomy. Precondition failures
//!   ([`HalError::MissingResourceName`], [`HalError::MissingQuery`],
//!   [`HalError::UnsupportedMethod`]) are returned before any transport call;
//!   [`HalError::RequestFailed`] covers transport and non-2xx outcomes and is
//!   never cached; [`HalError::Hydration`] wraps a HAL shape problem.
//! - [`HydrationError`]: a malformed HAL shape. For a top-level resource or
//!   paged collection this fails the whole result; for collection elements it
//!   is recorded per item on the hydrated collection instead, so one bad
//!   element does not abort an otherwise valid collection.
//!
//! All variants carry owned, cloneable data (strings, numbers, JSON values)
//! so a resolved outcome can be handed to every waiter sharing a cached
//! in-flight request.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for HAL client operations.
pub type Result<T> = std::result::Result<T, HalError>;

/// A malformed HAL shape encountered during hydration.
#[derive(Debug, Clone, Error)]
pub enum HydrationError {
    /// The payload does not have the basic structure its shape requires,
    /// e.g. a scalar handed to resource hydration.
    #[error("payload is not a valid {shape}: {reason}")]
    ShapeMismatch {
        /// The shape hydration was asked to produce.
        shape: String,
        /// What the payload actually looked like.
        reason: String,
    },

    /// The `page` block is missing or has non-numeric required fields
    /// (`size`, `totalElements`, `totalPages`, `number`).
    #[error("malformed page metadata: {reason}")]
    MalformedPage {
        /// Why the page block could not be read.
        reason: String,
    },

    /// The `_links` value is not a valid relation map.
    #[error("malformed _links object: {reason}")]
    MalformedLinks {
        /// Why the link map could not be read.
        reason: String,
    },

    /// The `_embedded` value is not a mapping of relation name to
    /// object/array.
    #[error("malformed _embedded object: {reason}")]
    MalformedEmbedded {
        /// Why the embedded map could not be read.
        reason: String,
    },

    /// A collection element could not be hydrated. The element is kept
    /// verbatim in `value` so callers can still inspect it.
    #[error("element {index} under relation '{relation}' is not a resource object")]
    InvalidItem {
        /// Relation name under `_embedded` the element was found in.
        relation: String,
        /// Zero-based position of the element in the source array.
        index: usize,
        /// The un-hydrated source element.
        value: Value,
    },
}

/// Errors produced by the HAL client.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// `custom_query` was called with an empty resource name.
    #[error("resource name should be defined")]
    MissingResourceName,

    /// `custom_query` was called with an empty query path.
    #[error("query should be defined")]
    MissingQuery,

    /// The HTTP method is not one of GET/POST/PUT/PATCH.
    #[error("allowed only GET/POST/PUT/PATCH http methods, you passed {0}")]
    UnsupportedMethod(String),

    /// A link relation was requested that the resource does not expose.
    #[error("resource has no '{rel}' link relation")]
    UnknownRelation {
        /// The missing relation name.
        rel: String,
    },

    /// The transport call failed or the server answered outside 2xx.
    ///
    /// `reason` already includes the status line when one was received;
    /// `status` keeps it machine-readable.
    #[error("{method} {url} failed: {reason}")]
    RequestFailed {
        /// HTTP method of the failed request.
        method: String,
        /// Fully resolved request URL.
        url: String,
        /// HTTP status code, when a response was received at all.
        status: Option<u16>,
        /// Human-readable failure cause.
        reason: String,
    },

    /// The response body was valid JSON but not a valid HAL shape.
    #[error(transparent)]
    Hydration(#[from] HydrationError),

    /// Invalid library configuration, including attempts to re-register
    /// resource types after first use.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl HalError {
    /// Whether this error is a precondition failure, raised synchronously
    /// before any transport call was made.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            HalError::MissingResourceName
                | HalError::MissingQuery
                | HalError::UnsupportedMethod(_)
                | HalError::UnknownRelation { .. }
        )
    }

    /// HTTP status attached to the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            HalError::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(HalError::MissingResourceName.is_precondition());
        assert!(HalError::MissingQuery.is_precondition());
        assert!(HalError::UnsupportedMethod("DELETE".into()).is_precondition());
        assert!(!HalError::Configuration("bad".into()).is_precondition());
    }

    #[test]
    fn test_request_failed_display() {
        let err = HalError::RequestFailed {
            method: "GET".into(),
            url: "http://localhost/api/orders".into(),
            status: Some(404),
            reason: "HTTP 404 Not Found".into(),
        };
        let text = err.to_string();
        assert!(text.contains("GET"));
        assert!(text.contains("http://localhost/api/orders"));
        assert!(text.contains("404"));
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_unsupported_method_echoes_input() {
        let err = HalError::UnsupportedMethod("DELETE".into());
        assert!(err.to_string().contains("DELETE"));
        assert!(err.to_string().contains("GET/POST/PUT/PATCH"));
    }

    #[test]
    fn test_hydration_error_is_transparent() {
        let inner = HydrationError::MalformedPage {
            reason: "missing field `size`".into(),
        };
        let outer: HalError = inner.clone().into();
        assert_eq!(outer.to_string(), inner.to_string());
    }

    #[test]
    fn test_invalid_item_keeps_value() {
        let err = HydrationError::InvalidItem {
            relation: "orders".into(),
            index: 2,
            value: serde_json::json!("not an object"),
        };
        match err {
            HydrationError::InvalidItem { index, ref value, .. } => {
                assert_eq!(index, 2);
                assert_eq!(value, &serde_json::json!("not an object"));
            }
            _ => panic!("wrong variant"),
        }
    }
}
