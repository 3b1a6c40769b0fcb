//! Core request types: HTTP methods, paging/sort options.
//!
//! [`QueryOptions`] mirrors the option object accepted by HAL endpoints built
//! on Spring Data REST-style paging: a zero-based `page`, a page `size`, any
//! number of `sort` specifications, and free-form query parameters. Options
//! are serialized into transport parameters by
//! [`serialize_options`](crate::url::serialize_options).
//!
//! # Examples
//!
//! ```
//! use hal_client::{HttpMethod, QueryOptions, Sort, SortOrder};
//!
//! let options = QueryOptions::new()
//!     .with_page(0)
//!     .with_size(20)
//!     .with_sort(Sort::desc("createdAt"))
//!     .with_param("status", "OPEN");
//!
//! assert_eq!(options.page, Some(0));
//! assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
//! assert!(!HttpMethod::Delete.is_allowed());
//! ```

use crate::error::HalError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP methods understood by the client.
///
/// Only GET/POST/PUT/PATCH are dispatchable; `Delete` exists so that callers
/// can name it and receive the [`HalError::UnsupportedMethod`] rejection the
/// executor applies to anything outside the allowed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET: read, cacheable.
    Get,
    /// HTTP POST: create, bypasses the cache.
    Post,
    /// HTTP PUT: replace, bypasses the cache.
    Put,
    /// HTTP PATCH: partial update, bypasses the cache.
    Patch,
    /// HTTP DELETE: recognized but rejected by the executor.
    Delete,
}

impl HttpMethod {
    /// Canonical upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether the executor accepts this method.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, HttpMethod::Delete)
    }

    /// Whether responses to this method are cached.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(HalError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Sort direction for a [`Sort`] specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Wire token used in `sort=field,ORDER` parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sort specification: field name plus direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Field (property path) to sort by.
    pub field: String,
    /// Sort direction.
    pub order: SortOrder,
}

impl Sort {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Sort {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Sort {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Options applied to a query: paging, sorting, and extra parameters.
///
/// All fields are optional; `Default` produces an empty option set that
/// serializes to no parameters at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Zero-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub size: Option<u32>,
    /// Sort specifications, serialized in declaration order as repeated
    /// `sort=field,ORDER` parameters.
    pub sort: Vec<Sort>,
    /// Related resources to include in the representation.
    pub include: Option<String>,
    /// Server-side projection name to apply.
    pub projection: Option<String>,
    /// Free-form query parameters. Kept sorted by key so serialization is
    /// deterministic regardless of insertion order.
    pub params: BTreeMap<String, String>,
}

impl QueryOptions {
    /// Empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the zero-based page number.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Append a sort specification.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    /// Set the `include` parameter.
    pub fn with_include(mut self, include: impl Into<String>) -> Self {
        self.include = Some(include.into());
        self
    }

    /// Set the `projection` parameter.
    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = Some(projection.into());
        self
    }

    /// Add a free-form query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Whether no option was set at all.
    pub fn is_empty(&self) -> bool {
        self.page.is_none()
            && self.size.is_none()
            && self.sort.is_empty()
            && self.include.is_none()
            && self.projection.is_none()
            && self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip() {
        for method in [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
        ] {
            assert_eq!(method.as_str().parse::<HttpMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("patch".parse::<HttpMethod>().unwrap(), HttpMethod::Patch);
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let err = "TRACE".parse::<HttpMethod>().unwrap_err();
        assert!(matches!(err, HalError::UnsupportedMethod(m) if m == "TRACE"));
    }

    #[test]
    fn test_only_four_methods_are_allowed() {
        assert!(HttpMethod::Get.is_allowed());
        assert!(HttpMethod::Post.is_allowed());
        assert!(HttpMethod::Put.is_allowed());
        assert!(HttpMethod::Patch.is_allowed());
        assert!(!HttpMethod::Delete.is_allowed());
    }

    #[test]
    fn test_only_get_is_cacheable() {
        assert!(HttpMethod::Get.is_cacheable());
        assert!(!HttpMethod::Put.is_cacheable());
    }

    #[test]
    fn test_options_builder() {
        let options = QueryOptions::new()
            .with_page(2)
            .with_size(50)
            .with_sort(Sort::asc("name"))
            .with_sort(Sort::desc("createdAt"))
            .with_param("status", "OPEN");

        assert_eq!(options.page, Some(2));
        assert_eq!(options.size, Some(50));
        assert_eq!(options.sort.len(), 2);
        assert_eq!(options.sort[1].order, SortOrder::Desc);
        assert_eq!(options.params.get("status").unwrap(), "OPEN");
        assert!(!options.is_empty());
    }

    #[test]
    fn test_default_options_are_empty() {
        assert!(QueryOptions::default().is_empty());
    }
}
