//! Hydrated resource model.
//!
//! The typed object graph produced from HAL payloads:
//!
//! | Type | Source shape |
//! |------|--------------|
//! | [`Resource`] | object with `_links` (and possibly `_embedded`) |
//! | [`EmbeddedResource`] | object nested under an `_embedded` relation |
//! | [`CollectionResource`] | `_embedded` envelope without paging |
//! | [`PagedCollectionResource`] | `_embedded` envelope with a `page` block |
//! | [`Hydrated`] | any of the above, or raw JSON for non-HAL payloads |
//!
//! Instances are owned by whoever received them from the executor. An
//! embedded resource remembers its container only as a [`ParentRef`], the
//! relation name plus the container's `self` href, so the ownership graph
//! stays acyclic and serialization never traverses back up.
//!
//! All model types re-serialize to their HAL wire shape; the parent
//! back-reference is skipped.

use crate::error::HydrationError;
use crate::resource::classify::ResourceShape;
use crate::resource::link::{Link, LinkMap};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ops::Deref;

/// Non-owning back-reference from an embedded resource to its container.
///
/// Holds the relation name the resource was embedded under and, when the
/// container advertised one, the container's `self` href. It is an
/// identifier, not a pointer: looking the container up again is the
/// caller's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    /// Relation name under `_embedded` this resource appeared in.
    pub relation: String,
    /// `self` href of the containing resource or collection, if it had one.
    pub href: Option<String>,
}

impl ParentRef {
    /// Back-reference for `relation` within a container whose `self` href is
    /// `href`.
    pub fn new(relation: impl Into<String>, href: Option<String>) -> Self {
        ParentRef {
            relation: relation.into(),
            href,
        }
    }
}

/// A single hydrated domain entity with link relations.
///
/// Domain fields are kept as raw JSON values; use
/// [`deserialize_fields`](Resource::deserialize_fields) for a typed view.
/// The link map is read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    fields: Map<String, Value>,
    links: LinkMap,
    embedded: BTreeMap<String, EmbeddedValue>,
}

impl Resource {
    /// Assemble a resource from already-parsed parts.
    ///
    /// Hydration reaches this through the configured
    /// [`ResourceFactory`](crate::resource::registry::ResourceFactory);
    /// call it directly only when building payloads by hand.
    pub fn from_parts(
        fields: Map<String, Value>,
        links: LinkMap,
        embedded: BTreeMap<String, EmbeddedValue>,
    ) -> Self {
        Resource {
            fields,
            links,
            embedded,
        }
    }

    /// A resource carrying only domain fields, no links, no embedded
    /// children. Useful for building request bodies.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self::from_parts(fields, LinkMap::empty(), BTreeMap::new())
    }

    /// Domain field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// All domain fields (everything except `_links`/`_embedded`).
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Link relations of this resource.
    pub fn links(&self) -> &LinkMap {
        &self.links
    }

    /// First link descriptor under `rel`.
    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.get(rel)
    }

    /// The `self` link, when the source payload carried one.
    pub fn self_link(&self) -> Option<&Link> {
        self.links.self_link()
    }

    /// The `self` href, when the source payload carried one.
    pub fn self_href(&self) -> Option<&str> {
        self.links.self_href()
    }

    /// Embedded children under `rel`.
    pub fn embedded(&self, rel: &str) -> Option<&EmbeddedValue> {
        self.embedded.get(rel)
    }

    /// Iterate embedded relations in name order.
    pub fn embedded_relations(&self) -> impl Iterator<Item = (&str, &EmbeddedValue)> {
        self.embedded.iter().map(|(rel, value)| (rel.as_str(), value))
    }

    /// Whether any embedded children are present.
    pub fn has_embedded(&self) -> bool {
        !self.embedded.is_empty()
    }

    /// Deserialize the domain fields into a concrete type.
    ///
    /// This is the typed view the original subclass-based clients get from
    /// inheritance: `_links` and `_embedded` are not part of the input.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde::Deserialize;
    /// use serde_json::json;
    /// use hal_client::hydrate;
    ///
    /// #[derive(Deserialize)]
    /// struct Order { status: String }
    ///
    /// let payload = json!({"status": "OPEN", "_links": {"self": {"href": "http://h/orders/1"}}});
    /// let resource = hydrate(payload).unwrap().into_resource().unwrap();
    /// let order: Order = resource.deserialize_fields().unwrap();
    /// assert_eq!(order.status, "OPEN");
    /// ```
    pub fn deserialize_fields<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone()))
    }

    /// Re-serialize to the HAL wire shape.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.links.is_empty()) + usize::from(!self.embedded.is_empty());
        let mut map = serializer.serialize_map(Some(self.fields.len() + extra))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        if !self.links.is_empty() {
            map.serialize_entry("_links", &self.links)?;
        }
        if !self.embedded.is_empty() {
            map.serialize_entry("_embedded", &self.embedded)?;
        }
        map.end()
    }
}

/// A resource that appeared under another resource's `_embedded` key.
///
/// Behaves as a [`Resource`] (via `Deref`) and additionally knows which
/// relation of which container it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedResource {
    resource: Resource,
    parent: ParentRef,
}

impl EmbeddedResource {
    /// Wrap a hydrated resource with its container back-reference.
    pub fn new(resource: Resource, parent: ParentRef) -> Self {
        EmbeddedResource { resource, parent }
    }

    /// The embedded resource itself.
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Discard the back-reference and keep the resource.
    pub fn into_resource(self) -> Resource {
        self.resource
    }

    /// Back-reference to the containing resource or collection.
    pub fn parent(&self) -> &ParentRef {
        &self.parent
    }
}

impl Deref for EmbeddedResource {
    type Target = Resource;

    fn deref(&self) -> &Resource {
        &self.resource
    }
}

// Writes exactly what stood under the `_embedded` relation; the
// back-reference never reaches the wire.
impl Serialize for EmbeddedResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.resource.serialize(serializer)
    }
}

/// One-or-many embedded resources under a single relation, mirroring the
/// single-object vs array distinction of the source payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddedValue {
    /// The relation embedded a single object.
    Single(Box<EmbeddedResource>),
    /// The relation embedded an array.
    Array(Vec<EmbeddedResource>),
}

impl EmbeddedValue {
    /// First embedded resource under the relation, if any.
    pub fn first(&self) -> Option<&EmbeddedResource> {
        match self {
            EmbeddedValue::Single(resource) => Some(resource),
            EmbeddedValue::Array(resources) => resources.first(),
        }
    }

    /// Iterate embedded resources in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, EmbeddedResource> {
        match self {
            EmbeddedValue::Single(resource) => std::slice::from_ref(resource.as_ref()).iter(),
            EmbeddedValue::Array(resources) => resources.iter(),
        }
    }

    /// Number of embedded resources under the relation.
    pub fn len(&self) -> usize {
        match self {
            EmbeddedValue::Single(_) => 1,
            EmbeddedValue::Array(resources) => resources.len(),
        }
    }

    /// Whether the relation embedded an empty array.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for EmbeddedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EmbeddedValue::Single(resource) => resource.serialize(serializer),
            EmbeddedValue::Array(resources) => resources.serialize(serializer),
        }
    }
}

/// An ordered group of resources hydrated from an `_embedded` envelope.
///
/// Element order matches the source payload; elements are not deduplicated.
/// Elements that could not be hydrated are recorded in
/// [`item_errors`](CollectionResource::item_errors) instead of aborting the
/// collection.
#[derive(Debug, Clone)]
pub struct CollectionResource {
    items: Vec<EmbeddedResource>,
    links: LinkMap,
    item_errors: Vec<HydrationError>,
}

impl CollectionResource {
    /// Assemble a collection from already-hydrated parts.
    pub fn from_parts(
        items: Vec<EmbeddedResource>,
        links: LinkMap,
        item_errors: Vec<HydrationError>,
    ) -> Self {
        CollectionResource {
            items,
            links,
            item_errors,
        }
    }

    /// Hydrated elements in source order.
    pub fn items(&self) -> &[EmbeddedResource] {
        &self.items
    }

    /// Iterate hydrated elements.
    pub fn iter(&self) -> std::slice::Iter<'_, EmbeddedResource> {
        self.items.iter()
    }

    /// Element by position.
    pub fn get(&self, index: usize) -> Option<&EmbeddedResource> {
        self.items.get(index)
    }

    /// Number of hydrated elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection hydrated no element.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Collection-level link relations.
    pub fn links(&self) -> &LinkMap {
        &self.links
    }

    /// The collection's own `self` href, if present.
    pub fn self_href(&self) -> Option<&str> {
        self.links.self_href()
    }

    /// Elements that failed hydration, with their position and raw value.
    pub fn item_errors(&self) -> &[HydrationError] {
        &self.item_errors
    }

    /// Take ownership of the hydrated elements.
    pub fn into_items(self) -> Vec<EmbeddedResource> {
        self.items
    }

    fn grouped_by_relation(&self) -> Vec<(&str, Vec<&EmbeddedResource>)> {
        let mut groups: Vec<(&str, Vec<&EmbeddedResource>)> = Vec::new();
        for item in &self.items {
            let rel = item.parent().relation.as_str();
            match groups.iter_mut().find(|(name, _)| *name == rel) {
                Some((_, members)) => members.push(item),
                None => groups.push((rel, vec![item])),
            }
        }
        groups
    }
}

impl Serialize for CollectionResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let groups = self.grouped_by_relation();
        if !groups.is_empty() {
            let embedded: BTreeMap<&str, &Vec<&EmbeddedResource>> =
                groups.iter().map(|(rel, members)| (*rel, members)).collect();
            map.serialize_entry("_embedded", &embedded)?;
        }
        if !self.links.is_empty() {
            map.serialize_entry("_links", &self.links)?;
        }
        map.end()
    }
}

/// Paging metadata copied verbatim from a paged collection's `page` block.
///
/// Well-formed servers maintain `total_pages == ceil(total_elements / size)`
/// for `size > 0`; [`pages_consistent`](PageMetadata::pages_consistent)
/// checks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Requested page size.
    pub size: u64,
    /// Total number of elements across all pages.
    pub total_elements: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Current page, zero-based.
    pub number: u64,
}

impl PageMetadata {
    /// Whether `total_pages` agrees with `ceil(total_elements / size)`.
    /// Vacuously true for `size == 0`.
    pub fn pages_consistent(&self) -> bool {
        self.size == 0 || self.total_pages == self.total_elements.div_ceil(self.size)
    }

    /// Whether this is the first page.
    pub fn is_first(&self) -> bool {
        self.number == 0
    }

    /// Whether this is the last page.
    pub fn is_last(&self) -> bool {
        // The page number comes off the wire; `number + 1` could overflow.
        self.number >= self.total_pages.saturating_sub(1)
    }
}

/// A [`CollectionResource`] with paging metadata and page-navigation links.
#[derive(Debug, Clone)]
pub struct PagedCollectionResource {
    collection: CollectionResource,
    page: PageMetadata,
}

impl PagedCollectionResource {
    /// Assemble a paged collection from its collection and metadata.
    pub fn new(collection: CollectionResource, page: PageMetadata) -> Self {
        PagedCollectionResource { collection, page }
    }

    /// Paging metadata.
    pub fn page(&self) -> &PageMetadata {
        &self.page
    }

    /// The underlying collection.
    pub fn collection(&self) -> &CollectionResource {
        &self.collection
    }

    /// Discard the paging metadata, keeping the collection.
    pub fn into_collection(self) -> CollectionResource {
        self.collection
    }

    /// Whether a `next` page link is advertised.
    pub fn has_next(&self) -> bool {
        self.links().contains("next")
    }

    /// Whether a `prev` page link is advertised.
    pub fn has_prev(&self) -> bool {
        self.links().contains("prev")
    }

    /// Link to the next page, when advertised.
    pub fn next_link(&self) -> Option<&Link> {
        self.links().get("next")
    }

    /// Link to the previous page, when advertised.
    pub fn prev_link(&self) -> Option<&Link> {
        self.links().get("prev")
    }

    /// Link to the first page, when advertised.
    pub fn first_link(&self) -> Option<&Link> {
        self.links().get("first")
    }

    /// Link to the last page, when advertised.
    pub fn last_link(&self) -> Option<&Link> {
        self.links().get("last")
    }
}

impl Deref for PagedCollectionResource {
    type Target = CollectionResource;

    fn deref(&self) -> &CollectionResource {
        &self.collection
    }
}

impl Serialize for PagedCollectionResource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let groups = self.collection.grouped_by_relation();
        if !groups.is_empty() {
            let embedded: BTreeMap<&str, &Vec<&EmbeddedResource>> =
                groups.iter().map(|(rel, members)| (*rel, members)).collect();
            map.serialize_entry("_embedded", &embedded)?;
        }
        if !self.collection.links().is_empty() {
            map.serialize_entry("_links", self.collection.links())?;
        }
        map.serialize_entry("page", &self.page)?;
        map.end()
    }
}

/// A hydrated response: one of the typed HAL shapes, or raw JSON when the
/// payload was not HAL at all.
#[derive(Debug, Clone)]
pub enum Hydrated {
    /// A single resource.
    Resource(Resource),
    /// An unpaged collection.
    Collection(CollectionResource),
    /// A paged collection.
    PagedCollection(PagedCollectionResource),
    /// A non-HAL payload, passed through unmodified.
    Raw(Value),
}

impl Hydrated {
    /// Shape this value hydrated as.
    pub fn shape(&self) -> ResourceShape {
        match self {
            Hydrated::Resource(_) => ResourceShape::Resource,
            Hydrated::Collection(_) => ResourceShape::Collection,
            Hydrated::PagedCollection(_) => ResourceShape::PagedCollection,
            Hydrated::Raw(_) => ResourceShape::Opaque,
        }
    }

    /// Borrow as a resource, if that is what hydration produced.
    pub fn as_resource(&self) -> Option<&Resource> {
        match self {
            Hydrated::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    /// Borrow as a collection, if that is what hydration produced.
    pub fn as_collection(&self) -> Option<&CollectionResource> {
        match self {
            Hydrated::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Borrow as a paged collection, if that is what hydration produced.
    pub fn as_paged_collection(&self) -> Option<&PagedCollectionResource> {
        match self {
            Hydrated::PagedCollection(paged) => Some(paged),
            _ => None,
        }
    }

    /// Borrow the raw passthrough value, if the payload was not HAL.
    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            Hydrated::Raw(value) => Some(value),
            _ => None,
        }
    }

    /// Consume into a resource, if that is what hydration produced.
    pub fn into_resource(self) -> Option<Resource> {
        match self {
            Hydrated::Resource(resource) => Some(resource),
            _ => None,
        }
    }

    /// Consume into a collection, if that is what hydration produced.
    pub fn into_collection(self) -> Option<CollectionResource> {
        match self {
            Hydrated::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    /// Consume into a paged collection, if that is what hydration produced.
    pub fn into_paged_collection(self) -> Option<PagedCollectionResource> {
        match self {
            Hydrated::PagedCollection(paged) => Some(paged),
            _ => None,
        }
    }
}
