//! Payload shape classification.
//!
//! Every response body is classified before hydration. The rules are
//! ordered and the first match wins:
//!
//! | # | Condition | Shape |
//! |---|-----------|-------|
//! | 1 | object with a `page` object, an `_embedded` object and no domain fields | [`ResourceShape::PagedCollection`] |
//! | 2 | object with an `_embedded` object, no `page` key and no domain fields | [`ResourceShape::Collection`] |
//! | 3 | object with a `_links` key | [`ResourceShape::Resource`] |
//! | 4 | anything else | [`ResourceShape::Opaque`] |
//!
//! A *domain field* is any key other than `_links`, `_embedded` and `page`.
//! The presence of `_links` never demotes a collection: Spring Data
//! endpoints put navigation links on every page. An object that carries
//! both `_embedded` and domain fields is a resource with embedded children,
//! not a collection.
//!
//! [`ResourceShape::Embedded`] is never produced by the top-level rules; it
//! is assigned by [`classify_embedded`] when the hydrator descends into an
//! `_embedded` relation.

use serde_json::{Map, Value};
use std::fmt;

/// Structural shape of a JSON payload, decided before hydration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceShape {
    /// Single resource: an object carrying `_links`.
    Resource,
    /// Unpaged collection: an `_embedded` envelope without a `page` block.
    Collection,
    /// Paged collection: an `_embedded` envelope with a `page` block.
    PagedCollection,
    /// Object found under an `_embedded` relation of another payload.
    Embedded,
    /// Not recognizably HAL; passed through as raw JSON.
    Opaque,
}

impl ResourceShape {
    /// Lowercase label for log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceShape::Resource => "resource",
            ResourceShape::Collection => "collection",
            ResourceShape::PagedCollection => "paged-collection",
            ResourceShape::Embedded => "embedded",
            ResourceShape::Opaque => "opaque",
        }
    }
}

impl fmt::Display for ResourceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a top-level payload.
///
/// Pure and total: never fails, never mutates. Malformed variants of the
/// reserved keys (a scalar `page`, a non-object `_embedded`) fail the
/// collection rules and fall through, so classification stays predictable
/// even on sloppy payloads. Whether the fallback shape can then be
/// hydrated is the hydrator's problem, not the classifier's.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use hal_client::{classify, ResourceShape};
///
/// let order = json!({"status": "OPEN", "_links": {"self": {"href": "/orders/1"}}});
/// assert_eq!(classify(&order), ResourceShape::Resource);
///
/// let page = json!({
///     "_embedded": {"orders": []},
///     "_links": {"self": {"href": "/orders"}},
///     "page": {"size": 20, "totalElements": 0, "totalPages": 0, "number": 0}
/// });
/// assert_eq!(classify(&page), ResourceShape::PagedCollection);
///
/// assert_eq!(classify(&json!([1, 2, 3])), ResourceShape::Opaque);
/// ```
pub fn classify(payload: &Value) -> ResourceShape {
    let object = match payload.as_object() {
        Some(object) => object,
        None => return ResourceShape::Opaque,
    };

    let embedded_is_object = matches!(object.get("_embedded"), Some(Value::Object(_)));
    let page_is_object = matches!(object.get("page"), Some(Value::Object(_)));

    if page_is_object && embedded_is_object && !has_domain_fields(object) {
        return ResourceShape::PagedCollection;
    }
    if embedded_is_object && !object.contains_key("page") && !has_domain_fields(object) {
        return ResourceShape::Collection;
    }
    if object.contains_key("_links") {
        return ResourceShape::Resource;
    }
    ResourceShape::Opaque
}

/// Classify a value found under an `_embedded` relation.
///
/// Any object classifies as [`ResourceShape::Embedded`] regardless of its
/// keys; anything else is opaque and gets rejected by the hydrator.
pub fn classify_embedded(value: &Value) -> ResourceShape {
    if value.is_object() {
        ResourceShape::Embedded
    } else {
        ResourceShape::Opaque
    }
}

fn has_domain_fields(object: &Map<String, Value>) -> bool {
    object
        .keys()
        .any(|key| key != "_links" && key != "_embedded" && key != "page")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paged_collection_wins_over_collection() {
        let payload = json!({
            "_embedded": {"orders": [{"status": "OPEN"}]},
            "_links": {"self": {"href": "/orders"}},
            "page": {"size": 20, "totalElements": 1, "totalPages": 1, "number": 0}
        });
        assert_eq!(classify(&payload), ResourceShape::PagedCollection);
    }

    #[test]
    fn test_links_do_not_demote_collections() {
        let payload = json!({
            "_embedded": {"orders": []},
            "_links": {"self": {"href": "/orders"}, "next": {"href": "/orders?page=1"}}
        });
        assert_eq!(classify(&payload), ResourceShape::Collection);
    }

    #[test]
    fn test_domain_fields_make_it_a_resource() {
        let payload = json!({
            "status": "OPEN",
            "_embedded": {"items": [{"sku": "a"}]},
            "_links": {"self": {"href": "/orders/1"}}
        });
        assert_eq!(classify(&payload), ResourceShape::Resource);
    }

    #[test]
    fn test_links_alone_make_a_resource() {
        let payload = json!({"_links": {"self": {"href": "/orders/1"}}});
        assert_eq!(classify(&payload), ResourceShape::Resource);
    }

    #[test]
    fn test_non_objects_are_opaque() {
        assert_eq!(classify(&json!([1, 2, 3])), ResourceShape::Opaque);
        assert_eq!(classify(&json!("plain")), ResourceShape::Opaque);
        assert_eq!(classify(&json!(null)), ResourceShape::Opaque);
        assert_eq!(classify(&json!(42)), ResourceShape::Opaque);
    }

    #[test]
    fn test_plain_object_is_opaque() {
        assert_eq!(classify(&json!({})), ResourceShape::Opaque);
        assert_eq!(classify(&json!({"status": "OPEN"})), ResourceShape::Opaque);
    }

    #[test]
    fn test_malformed_page_falls_through() {
        // Scalar `page` defeats rule 1; the key's presence defeats rule 2.
        let payload = json!({
            "_embedded": {"orders": []},
            "_links": {"self": {"href": "/orders"}},
            "page": 3
        });
        assert_eq!(classify(&payload), ResourceShape::Resource);

        let no_links = json!({"_embedded": {"orders": []}, "page": 3});
        assert_eq!(classify(&no_links), ResourceShape::Opaque);
    }

    #[test]
    fn test_malformed_embedded_falls_through() {
        let payload = json!({"_embedded": "oops", "_links": {"self": {"href": "/x"}}});
        assert_eq!(classify(&payload), ResourceShape::Resource);
    }

    #[test]
    fn test_classify_embedded() {
        assert_eq!(classify_embedded(&json!({"sku": "a"})), ResourceShape::Embedded);
        assert_eq!(classify_embedded(&json!("scalar")), ResourceShape::Opaque);
        assert_eq!(classify_embedded(&json!([{}])), ResourceShape::Opaque);
    }
}
