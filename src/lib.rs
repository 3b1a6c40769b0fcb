#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # hal-client: HAL+JSON for Rust
//!
//! This crate implements a client for [HAL+JSON](https://stateless.group/hal_specification.html)
//! APIs, the hypermedia format used by Spring Data REST and similar
//! frameworks: responses carry their domain fields next to `_links`
//! (relations to other resources), `_embedded` (inlined related resources)
//! and, for paged endpoints, a `page` metadata block.
//!
//! ## Overview
//!
//! Responses are handled in three steps:
//!
//! 1. **Classification** - fixed, ordered rules decide whether a payload is
//!    a single resource, a collection, a paged collection or plain JSON
//! 2. **Hydration** - the payload becomes a typed object graph: link maps,
//!    embedded resources with back-references to their container, page
//!    metadata
//! 3. **Caching** - `GET` responses are cached by request identity, with at
//!    most one in-flight request per identity; mutations invalidate the
//!    entries they touch
//!
//! ## Key Features
//!
//! - **Shape detection**: Spring-style pages keep their navigation links
//!   without being mistaken for plain resources
//! - **Recursive hydration**: embedded resources anywhere in the graph,
//!   each knowing the relation and container it came from
//! - **Lenient collections**: one malformed element is recorded, not fatal
//! - **Request coalescing**: concurrent identical `GET`s share one request
//! - **Write-through invalidation**: `POST`/`PUT`/`PATCH` drop related
//!   cached reads
//! - **Link traversal**: follow `_links` relations, with URI-template
//!   variables stripped from templated hrefs
//!
//! ## Client Usage
//!
//! ```ignore
//! use hal_client::{HalClient, HalConfiguration, HttpMethod, QueryOptions, Sort};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HalClient::new(HalConfiguration::new("http://localhost:8080/api"))?;
//!
//!     // Typed single-resource access.
//!     let order = client.get_resource("orders", "42", None).await?;
//!     println!("status: {:?}", order.get("status"));
//!
//!     // A paged, sorted collection.
//!     let page = client
//!         .get_page("orders", Some(QueryOptions::new().with_size(20).with_sort(Sort::desc("createdAt"))))
//!         .await?;
//!     println!("{} of {} orders", page.len(), page.page().total_elements);
//!
//!     // Anything else goes through custom_query.
//!     let found = client
//!         .custom_query("orders", HttpMethod::Get, "search/findByStatus", None, None)
//!         .await?;
//!     println!("hydrated as {}", found.shape());
//!     Ok(())
//! }
//! ```
//!
//! ## Hydration Without a Client
//!
//! The resource layer stands alone; any JSON value can be hydrated:
//!
//! ```
//! use serde_json::json;
//! use hal_client::hydrate;
//!
//! let order = hydrate(json!({
//!     "status": "OPEN",
//!     "_links": {"self": {"href": "http://localhost:8080/api/orders/42"}}
//! })).unwrap().into_resource().unwrap();
//! assert_eq!(order.self_href(), Some("http://localhost:8080/api/orders/42"));
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - HTTP methods, sorting, query options
//! - **[error]** - Error types and result handling
//! - **[config]** - Client and cache configuration
//! - **[url]** - Resource URL building and option serialization
//! - **[resource]** - Classification, hydration and the resource model
//! - **[client]** - Transport, response cache, executor and `HalClient`

pub mod client;
pub mod config;
pub mod error;
pub mod resource;
pub mod types;
pub mod url;

pub use client::{
    CacheKey, HalClient, HttpExecutor, ReqwestTransport, ResponseCache, Transport,
    TransportResponse,
};
pub use config::{CacheSettings, HalConfiguration};
pub use error::{HalError, HydrationError, Result};
pub use resource::{
    classify, configure_resource_factory, hydrate, hydrate_with, CollectionResource,
    DefaultResourceFactory, EmbeddedResource, EmbeddedValue, Hydrated, Link, LinkMap, LinkValue,
    PageMetadata, PagedCollectionResource, ParentRef, Resource, ResourceFactory, ResourceShape,
    SELF_REL,
};
pub use types::{HttpMethod, QueryOptions, Sort, SortOrder};
