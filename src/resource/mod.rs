//! HAL resource model, classification and hydration.
//!
//! Response bodies move through a fixed pipeline: [`classify`] decides the
//! structural shape of the JSON, [`hydrate`] turns it into the typed model,
//! and the [`registry`] supplies the constructors used along the way.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`link`] | `_links` parsing, one-or-many link values, templated hrefs |
//! | [`classify`] | ordered shape-detection rules |
//! | [`model`] | resources, embedded resources, collections, page metadata |
//! | [`hydrate`] | recursive payload-to-model conversion |
//! | [`registry`] | write-once factory for model construction |

pub mod classify;
pub mod hydrate;
pub mod link;
pub mod model;
pub mod registry;

pub use classify::{classify, classify_embedded, ResourceShape};
pub use hydrate::{hydrate, hydrate_with};
pub use link::{Link, LinkMap, LinkValue, SELF_REL};
pub use model::{
    CollectionResource, EmbeddedResource, EmbeddedValue, Hydrated, PageMetadata,
    PagedCollectionResource, ParentRef, Resource,
};
pub use registry::{configure_resource_factory, DefaultResourceFactory, ResourceFactory};
