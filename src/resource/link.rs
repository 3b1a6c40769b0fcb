//! Link relations: the `_links` half of the HAL wire format.
//!
//! A HAL payload advertises its relations as
//! `"_links": {"rel": {"href": "...", "templated": true}}` where each
//! relation value is a single link descriptor or an array of them. The parsed
//! [`LinkMap`] is read-only after construction: hydration builds it once and
//! callers only look relations up.

use crate::error::HydrationError;
use crate::url::strip_template_vars;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Relation name every hydrated resource exposes when present in the source.
pub const SELF_REL: &str = "self";

/// A single link descriptor: `{href, templated?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Target URL, possibly templated.
    pub href: String,
    /// Whether `href` contains RFC 6570 template expressions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
}

impl Link {
    /// Plain (non-templated) link to `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Link {
            href: href.into(),
            templated: None,
        }
    }

    /// Whether the href carries template expressions.
    pub fn is_templated(&self) -> bool {
        self.templated.unwrap_or(false)
    }

    /// Href with any un-expanded template variables removed, ready to fetch.
    pub fn resolved_href(&self) -> String {
        if self.is_templated() {
            strip_template_vars(&self.href)
        } else {
            self.href.clone()
        }
    }
}

/// One or more link descriptors under a single relation name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkValue {
    /// The relation holds a single descriptor.
    Single(Link),
    /// The relation holds an array of descriptors.
    Array(Vec<Link>),
}

impl LinkValue {
    /// First descriptor under the relation, if any.
    pub fn first(&self) -> Option<&Link> {
        match self {
            LinkValue::Single(link) => Some(link),
            LinkValue::Array(links) => links.first(),
        }
    }

    /// Iterate all descriptors under the relation.
    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        match self {
            LinkValue::Single(link) => std::slice::from_ref(link).iter(),
            LinkValue::Array(links) => links.iter(),
        }
    }

    /// Number of descriptors under the relation.
    pub fn len(&self) -> usize {
        match self {
            LinkValue::Single(_) => 1,
            LinkValue::Array(links) => links.len(),
        }
    }

    /// Whether the relation holds no descriptor at all (empty array form).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parsed `_links` map: relation name to one-or-more descriptors.
///
/// Read-only after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkMap(BTreeMap<String, LinkValue>);

impl LinkMap {
    /// Empty link map.
    pub fn empty() -> Self {
        LinkMap(BTreeMap::new())
    }

    /// Parse a `_links` JSON value.
    ///
    /// # Errors
    ///
    /// [`HydrationError::MalformedLinks`] when the value is not a valid
    /// relation map (a descriptor without `href`, a scalar relation value,
    /// or a non-object `_links`).
    pub fn from_value(value: &Value) -> Result<Self, HydrationError> {
        serde_json::from_value(value.clone()).map_err(|e| HydrationError::MalformedLinks {
            reason: e.to_string(),
        })
    }

    /// First descriptor under `rel`, if the relation exists.
    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.0.get(rel).and_then(LinkValue::first)
    }

    /// All descriptors under `rel`.
    pub fn get_all(&self, rel: &str) -> Option<&LinkValue> {
        self.0.get(rel)
    }

    /// The `self` link descriptor, when the source payload carried one.
    pub fn self_link(&self) -> Option<&Link> {
        self.get(SELF_REL)
    }

    /// The `self` href, when the source payload carried one.
    pub fn self_href(&self) -> Option<&str> {
        self.self_link().map(|link| link.href.as_str())
    }

    /// Whether the relation exists.
    pub fn contains(&self, rel: &str) -> bool {
        self.0.contains_key(rel)
    }

    /// Iterate relations in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LinkValue)> {
        self.0.iter().map(|(rel, value)| (rel.as_str(), value))
    }

    /// Number of relations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no relation is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
