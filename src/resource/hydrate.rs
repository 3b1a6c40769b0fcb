//! Payload hydration.
//!
//! Turns classified JSON payloads into the typed model, recursively:
//! `_links` becomes a [`LinkMap`], `_embedded` children become
//! [`EmbeddedResource`]s carrying a back-reference to their immediate
//! container, everything else stays a domain field. All construction goes
//! through the configured
//! [`ResourceFactory`](crate::resource::registry::ResourceFactory).
//!
//! Strictness differs by context. A single resource is one entity, so any
//! malformed part (`_links`, `_embedded`, a bad embedded element) fails the
//! whole resource. A collection is a feed: elements that cannot be
//! hydrated are recorded as [`HydrationError::InvalidItem`] on the
//! collection and skipped, and surviving elements keep their source order.
//! Paging metadata is load-bearing, so a malformed `page` block fails the
//! whole paged collection.
//!
//! The input payload is consumed, never mutated in place: callers that
//! need the raw JSON afterwards keep their own copy.

use crate::error::HydrationError;
use crate::resource::classify::{classify, classify_embedded, ResourceShape};
use crate::resource::link::LinkMap;
use crate::resource::model::{
    CollectionResource, EmbeddedValue, Hydrated, PageMetadata, PagedCollectionResource, ParentRef,
    Resource,
};
use crate::resource::registry::{self, ResourceFactory};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Classify and hydrate a payload with the process-wide factory.
///
/// Non-HAL payloads come back untouched as [`Hydrated::Raw`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use hal_client::hydrate;
///
/// let payload = json!({
///     "status": "OPEN",
///     "_links": {"self": {"href": "http://h/api/orders/1"}}
/// });
/// let resource = hydrate(payload).unwrap().into_resource().unwrap();
/// assert_eq!(resource.self_href(), Some("http://h/api/orders/1"));
/// ```
pub fn hydrate(payload: Value) -> Result<Hydrated, HydrationError> {
    let shape = classify(&payload);
    hydrate_with(payload, shape, registry::current().as_ref())
}

/// Hydrate a payload whose shape has already been decided, using an
/// explicit factory.
///
/// This is the full contract behind [`hydrate`]; it exists for callers
/// that classify themselves or carry their own factory. A payload marked
/// [`ResourceShape::Embedded`] outside a container hydrates as a plain
/// resource.
pub fn hydrate_with(
    payload: Value,
    shape: ResourceShape,
    factory: &dyn ResourceFactory,
) -> Result<Hydrated, HydrationError> {
    tracing::debug!(shape = %shape, "hydrating payload");
    match shape {
        ResourceShape::Resource | ResourceShape::Embedded => {
            hydrate_resource(payload, factory).map(Hydrated::Resource)
        }
        ResourceShape::Collection => {
            hydrate_collection(payload, factory).map(Hydrated::Collection)
        }
        ResourceShape::PagedCollection => {
            hydrate_paged(payload, factory).map(Hydrated::PagedCollection)
        }
        ResourceShape::Opaque => Ok(Hydrated::Raw(payload)),
    }
}

fn hydrate_resource(
    payload: Value,
    factory: &dyn ResourceFactory,
) -> Result<Resource, HydrationError> {
    let mut object = expect_object(payload, "resource")?;
    let links = take_links(&mut object)?;
    let self_href = links.self_href().map(str::to_string);

    let embedded = match object.remove("_embedded") {
        Some(Value::Object(relations)) => {
            hydrate_embedded_relations(relations, self_href.as_deref(), factory)?
        }
        Some(other) => {
            return Err(HydrationError::MalformedEmbedded {
                reason: format!("expected an object, found {}", kind_of(&other)),
            })
        }
        None => BTreeMap::new(),
    };

    // Remaining keys are domain fields, kept verbatim. A `page` key on a
    // resource is just another field.
    Ok(factory.resource(object, links, embedded))
}

/// Hydrate the relations of a resource's `_embedded` object. Inside a
/// resource every element must hydrate; the first failure aborts.
fn hydrate_embedded_relations(
    relations: Map<String, Value>,
    parent_href: Option<&str>,
    factory: &dyn ResourceFactory,
) -> Result<BTreeMap<String, EmbeddedValue>, HydrationError> {
    let mut embedded = BTreeMap::new();
    for (rel, value) in relations {
        match value {
            Value::Object(_) => {
                let resource = hydrate_resource(value, factory)?;
                let parent = ParentRef::new(rel.clone(), parent_href.map(str::to_string));
                embedded.insert(
                    rel,
                    EmbeddedValue::Single(Box::new(factory.embedded(resource, parent))),
                );
            }
            Value::Array(elements) => {
                let mut members = Vec::with_capacity(elements.len());
                for (index, element) in elements.into_iter().enumerate() {
                    if classify_embedded(&element) != ResourceShape::Embedded {
                        return Err(HydrationError::InvalidItem {
                            relation: rel,
                            index,
                            value: element,
                        });
                    }
                    let resource = hydrate_resource(element, factory)?;
                    let parent = ParentRef::new(rel.clone(), parent_href.map(str::to_string));
                    members.push(factory.embedded(resource, parent));
                }
                embedded.insert(rel, EmbeddedValue::Array(members));
            }
            other => {
                return Err(HydrationError::MalformedEmbedded {
                    reason: format!(
                        "relation '{rel}' holds {}, expected object or array",
                        kind_of(&other)
                    ),
                })
            }
        }
    }
    Ok(embedded)
}

fn hydrate_collection(
    payload: Value,
    factory: &dyn ResourceFactory,
) -> Result<CollectionResource, HydrationError> {
    let mut object = expect_object(payload, "collection")?;
    let links = take_links(&mut object)?;
    let self_href = links.self_href().map(str::to_string);

    let relations = match object.remove("_embedded") {
        Some(Value::Object(relations)) => relations,
        Some(other) => {
            return Err(HydrationError::MalformedEmbedded {
                reason: format!("expected an object, found {}", kind_of(&other)),
            })
        }
        None => {
            return Err(HydrationError::MalformedEmbedded {
                reason: "collection payload has no _embedded object".to_string(),
            })
        }
    };

    let mut items = Vec::new();
    let mut item_errors = Vec::new();
    for (rel, value) in relations {
        let elements = match value {
            Value::Array(elements) => elements,
            // A single embedded object is a one-element relation.
            Value::Object(_) => vec![value],
            other => {
                tracing::debug!(relation = %rel, "skipping non-array collection relation");
                item_errors.push(HydrationError::InvalidItem {
                    relation: rel,
                    index: 0,
                    value: other,
                });
                continue;
            }
        };
        for (index, element) in elements.into_iter().enumerate() {
            if classify_embedded(&element) != ResourceShape::Embedded {
                tracing::debug!(relation = %rel, index, "skipping non-object collection element");
                item_errors.push(HydrationError::InvalidItem {
                    relation: rel.clone(),
                    index,
                    value: element,
                });
                continue;
            }
            match hydrate_resource(element.clone(), factory) {
                Ok(resource) => {
                    let parent = ParentRef::new(rel.clone(), self_href.clone());
                    items.push(factory.embedded(resource, parent));
                }
                Err(err) => {
                    tracing::debug!(relation = %rel, index, reason = %err, "skipping element that failed hydration");
                    item_errors.push(HydrationError::InvalidItem {
                        relation: rel.clone(),
                        index,
                        value: element,
                    });
                }
            }
        }
    }

    Ok(factory.collection(items, links, item_errors))
}

fn hydrate_paged(
    payload: Value,
    factory: &dyn ResourceFactory,
) -> Result<PagedCollectionResource, HydrationError> {
    let mut object = expect_object(payload, "paged collection")?;
    let page_value = object.remove("page").ok_or_else(|| HydrationError::MalformedPage {
        reason: "payload has no page object".to_string(),
    })?;
    let page: PageMetadata =
        serde_json::from_value(page_value).map_err(|err| HydrationError::MalformedPage {
            reason: err.to_string(),
        })?;
    let collection = hydrate_collection(Value::Object(object), factory)?;
    Ok(factory.paged_collection(collection, page))
}

fn expect_object(payload: Value, shape: &str) -> Result<Map<String, Value>, HydrationError> {
    match payload {
        Value::Object(object) => Ok(object),
        other => Err(HydrationError::ShapeMismatch {
            shape: shape.to_string(),
            reason: format!("payload is {}", kind_of(&other)),
        }),
    }
}

fn take_links(object: &mut Map<String, Value>) -> Result<LinkMap, HydrationError> {
    match object.remove("_links") {
        Some(value) => LinkMap::from_value(&value),
        None => Ok(LinkMap::empty()),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
