//! Write-once resource factory registry.
//!
//! Hydration never constructs model types directly; it goes through the
//! process-wide [`ResourceFactory`]. Applications that want to observe or
//! decorate construction install their own factory with
//! [`configure_resource_factory`] once at startup, before the first
//! hydration. After that the registration is frozen: hydration must see
//! the same constructors for the lifetime of the process, so a second
//! registration (or one that arrives after hydration already ran) is
//! rejected.
//!
//! Most applications never touch this module; the default factory builds
//! the plain model types.

use crate::error::{HalError, HydrationError, Result};
use crate::resource::link::LinkMap;
use crate::resource::model::{
    CollectionResource, EmbeddedResource, EmbeddedValue, PageMetadata, PagedCollectionResource,
    ParentRef, Resource,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Construction hooks for the hydrated model types.
///
/// Every method has a default body that builds the plain type, so an
/// implementation only overrides the shapes it cares about.
pub trait ResourceFactory: Send + Sync {
    /// Build a single resource from its parsed parts.
    fn resource(
        &self,
        fields: Map<String, Value>,
        links: LinkMap,
        embedded: BTreeMap<String, EmbeddedValue>,
    ) -> Resource {
        Resource::from_parts(fields, links, embedded)
    }

    /// Wrap a hydrated resource found under an `_embedded` relation.
    fn embedded(&self, resource: Resource, parent: ParentRef) -> EmbeddedResource {
        EmbeddedResource::new(resource, parent)
    }

    /// Build an unpaged collection.
    fn collection(
        &self,
        items: Vec<EmbeddedResource>,
        links: LinkMap,
        item_errors: Vec<HydrationError>,
    ) -> CollectionResource {
        CollectionResource::from_parts(items, links, item_errors)
    }

    /// Attach paging metadata to a collection.
    fn paged_collection(
        &self,
        collection: CollectionResource,
        page: PageMetadata,
    ) -> PagedCollectionResource {
        PagedCollectionResource::new(collection, page)
    }
}

/// The stock factory: builds the plain model types, nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultResourceFactory;

impl ResourceFactory for DefaultResourceFactory {}

static FACTORY: OnceLock<Arc<dyn ResourceFactory>> = OnceLock::new();

/// Install the process-wide resource factory.
///
/// Call at most once, before any hydration. Returns
/// [`HalError::Configuration`] if a factory is already in place, including
/// the default one that gets installed implicitly the first time a payload
/// is hydrated.
pub fn configure_resource_factory(factory: Arc<dyn ResourceFactory>) -> Result<()> {
    if FACTORY.set(factory).is_err() {
        tracing::error!("resource factory already configured; registration can be done only once");
        return Err(HalError::Configuration(
            "resource factory already configured; registration can be done only once".to_string(),
        ));
    }
    Ok(())
}

/// The active factory, installing the default on first use.
pub(crate) fn current() -> &'static Arc<dyn ResourceFactory> {
    FACTORY.get_or_init(|| Arc::new(DefaultResourceFactory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_is_write_once() {
        // Other tests may already have hydrated something, so the first
        // call can go either way; the second is always rejected.
        let _ = configure_resource_factory(Arc::new(DefaultResourceFactory));
        let err = configure_resource_factory(Arc::new(DefaultResourceFactory)).unwrap_err();
        assert!(matches!(err, HalError::Configuration(_)));
        assert!(err.to_string().contains("only once"));
    }

    #[test]
    fn test_default_factory_builds_plain_types() {
        let mut fields = Map::new();
        fields.insert("status".to_string(), json!("OPEN"));
        let built =
            DefaultResourceFactory.resource(fields.clone(), LinkMap::empty(), BTreeMap::new());
        assert_eq!(built, Resource::from_fields(fields));
    }
}
