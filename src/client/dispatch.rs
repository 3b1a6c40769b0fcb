//! High-level HAL client.
//!
//! [`HalClient`] is the entry point of the crate: it validates requests,
//! builds resource URLs from the configured base, and hands execution to
//! the caching [`HttpExecutor`].
//!
//! # Examples
//!
//! ## Custom query against a resource
//!
//! ```ignore
//! use hal_client::{HalClient, HalConfiguration, HttpMethod, QueryOptions, Sort};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HalClient::new(HalConfiguration::new("http://localhost:8080/api"))?;
//!
//!     let options = QueryOptions::new()
//!         .with_page(0)
//!         .with_size(20)
//!         .with_sort(Sort::desc("createdAt"));
//!     let result = client
//!         .custom_query("orders", HttpMethod::Get, "search/findByStatus", None, Some(options))
//!         .await?;
//!     println!("hydrated as {}", result.shape());
//!     Ok(())
//! }
//! ```
//!
//! ## Typed resource access
//!
//! ```ignore
//! use hal_client::{HalClient, HalConfiguration};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Order { status: String }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HalClient::new(HalConfiguration::new("http://localhost:8080/api"))?;
//!
//!     let resource = client.get_resource("orders", "42", None).await?;
//!     let order: Order = resource.deserialize_fields()?;
//!     println!("status: {}", order.status);
//!
//!     // Follow a relation advertised by the resource.
//!     let customer = client.get_relation(&resource, "customer", None).await?;
//!     println!("customer hydrated as {}", customer.shape());
//!     Ok(())
//! }
//! ```
//!
//! ## Walking a paged collection
//!
//! ```ignore
//! let mut page = client.get_page("orders", None).await?;
//! loop {
//!     for order in page.items() {
//!         println!("{:?}", order.get("status"));
//!     }
//!     match page.next_link() {
//!         Some(_) => page = client.get_page("orders", Some(
//!             QueryOptions::new().with_page(page.page().number as u32 + 1),
//!         )).await?,
//!         None => break,
//!     }
//! }
//! ```

use crate::client::executor::HttpExecutor;
use crate::client::transport::{ReqwestTransport, Transport};
use crate::config::HalConfiguration;
use crate::error::{HalError, HydrationError, Result};
use crate::resource::{
    CollectionResource, Hydrated, PagedCollectionResource, Resource, SELF_REL,
};
use crate::types::{HttpMethod, QueryOptions};
use crate::url;
use serde_json::Value;
use std::sync::Arc;

/// The HAL+JSON client.
///
/// Cheap to clone; clones share the same transport, configuration and
/// response cache.
///
/// # Features
///
/// - Resource URLs built from one configured base API URL
/// - Typed hydration of resources, collections and paged collections
/// - `GET` response caching with in-flight request coalescing
/// - Cache invalidation on `POST`/`PUT`/`PATCH`
/// - Link-relation traversal with URI-template stripping
#[derive(Clone)]
pub struct HalClient {
    executor: Arc<HttpExecutor>,
    config: Arc<HalConfiguration>,
}

impl HalClient {
    /// Build a client over the real HTTP transport.
    ///
    /// Fails with [`HalError::Configuration`] when the base API URL is
    /// empty or not an absolute URL.
    pub fn new(config: HalConfiguration) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config));
        Self::with_transport(config, transport)
    }

    /// Build a client over a custom [`Transport`].
    pub fn with_transport(config: HalConfiguration, transport: Arc<dyn Transport>) -> Result<Self> {
        url::validate_base_url(&config.base_api_url)?;
        let config = Arc::new(config);
        let executor = Arc::new(HttpExecutor::new(transport, Arc::clone(&config)));
        Ok(HalClient { executor, config })
    }

    /// Perform an arbitrary query under a resource.
    ///
    /// The request URL is `{base}/{resource_name}/{query}`. Validation
    /// happens before anything reaches the wire: an empty resource name,
    /// an empty query or a method outside `GET`/`POST`/`PUT`/`PATCH` fail
    /// immediately.
    ///
    /// # Arguments
    ///
    /// * `resource_name` - collection name under the base API URL
    /// * `method` - HTTP method to use
    /// * `query` - path below the resource, e.g. `search/findByStatus`
    /// * `body` - JSON body for mutating methods; ignored for `GET`
    /// * `options` - paging, sorting and extra parameters
    pub async fn custom_query(
        &self,
        resource_name: &str,
        method: HttpMethod,
        query: &str,
        body: Option<Value>,
        options: Option<QueryOptions>,
    ) -> Result<Hydrated> {
        if resource_name.trim().is_empty() {
            return Err(HalError::MissingResourceName);
        }
        if query.trim().is_empty() {
            return Err(HalError::MissingQuery);
        }
        if !method.is_allowed() {
            return Err(HalError::UnsupportedMethod(method.to_string()));
        }

        let url = url::build_resource_url(&self.config.base_api_url, resource_name, query);
        let params = url::serialize_options(options.as_ref());
        if self.config.verbose_logs {
            tracing::info!(
                method = %method,
                url = %url,
                params = ?params,
                has_body = body.is_some(),
                "custom query request"
            );
        }

        let result = self.executor.execute(method, &url, &params, body.as_ref()).await;
        if self.config.verbose_logs {
            match &result {
                Ok(hydrated) => {
                    tracing::info!(url = %url, shape = %hydrated.shape(), "custom query response");
                }
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "custom query failed");
                }
            }
        }
        result
    }

    /// `GET {base}/{resource_name}/{id}`, expecting a single resource.
    pub async fn get_resource(
        &self,
        resource_name: &str,
        id: &str,
        options: Option<QueryOptions>,
    ) -> Result<Resource> {
        if resource_name.trim().is_empty() {
            return Err(HalError::MissingResourceName);
        }
        let url = url::build_resource_url(&self.config.base_api_url, resource_name, id);
        let params = url::serialize_options(options.as_ref());
        expect_resource(self.executor.get(&url, &params).await?)
    }

    /// `GET {base}/{resource_name}`, expecting a collection.
    ///
    /// A paged response is accepted too; its metadata is dropped.
    pub async fn get_collection(
        &self,
        resource_name: &str,
        options: Option<QueryOptions>,
    ) -> Result<CollectionResource> {
        if resource_name.trim().is_empty() {
            return Err(HalError::MissingResourceName);
        }
        let url = url::build_resource_url(&self.config.base_api_url, resource_name, "");
        let params = url::serialize_options(options.as_ref());
        expect_collection(self.executor.get(&url, &params).await?)
    }

    /// `GET {base}/{resource_name}`, expecting a paged collection.
    pub async fn get_page(
        &self,
        resource_name: &str,
        options: Option<QueryOptions>,
    ) -> Result<PagedCollectionResource> {
        if resource_name.trim().is_empty() {
            return Err(HalError::MissingResourceName);
        }
        let url = url::build_resource_url(&self.config.base_api_url, resource_name, "");
        let params = url::serialize_options(options.as_ref());
        expect_page(self.executor.get(&url, &params).await?)
    }

    /// `GET {base}/{resource_name}/search/{query}`.
    pub async fn search(
        &self,
        resource_name: &str,
        query: &str,
        options: Option<QueryOptions>,
    ) -> Result<Hydrated> {
        if query.trim().is_empty() {
            return Err(HalError::MissingQuery);
        }
        self.custom_query(
            resource_name,
            HttpMethod::Get,
            &format!("search/{query}"),
            None,
            options,
        )
        .await
    }

    /// Follow a link relation advertised by `resource`.
    ///
    /// Templated hrefs have their URI-template variables stripped before
    /// the request. A relation the resource does not expose fails with
    /// [`HalError::UnknownRelation`] without touching the wire.
    pub async fn get_relation(
        &self,
        resource: &Resource,
        rel: &str,
        options: Option<QueryOptions>,
    ) -> Result<Hydrated> {
        let link = resource.link(rel).ok_or_else(|| HalError::UnknownRelation {
            rel: rel.to_string(),
        })?;
        let url = link.resolved_href();
        let params = url::serialize_options(options.as_ref());
        self.executor.get(&url, &params).await
    }

    /// `POST {base}/{resource_name}` with `body`.
    pub async fn create_resource(&self, resource_name: &str, body: Value) -> Result<Hydrated> {
        if resource_name.trim().is_empty() {
            return Err(HalError::MissingResourceName);
        }
        let url = url::build_resource_url(&self.config.base_api_url, resource_name, "");
        self.executor.post(&url, &Vec::new(), Some(&body)).await
    }

    /// `PUT` to the resource's own `self` href with `body`.
    pub async fn update_resource(&self, resource: &Resource, body: Value) -> Result<Hydrated> {
        let url = resource
            .self_href()
            .ok_or_else(|| HalError::UnknownRelation {
                rel: SELF_REL.to_string(),
            })?
            .to_string();
        self.executor.put(&url, &Vec::new(), Some(&body)).await
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.executor.cache().clear();
    }

    /// Drop cached responses under one resource name.
    pub fn invalidate_resource(&self, resource_name: &str) {
        let url = url::build_resource_url(&self.config.base_api_url, resource_name, "");
        self.executor.cache().invalidate_related(&url);
    }

    /// The configuration this client runs under.
    pub fn config(&self) -> &HalConfiguration {
        &self.config
    }
}

fn expect_resource(hydrated: Hydrated) -> Result<Resource> {
    match hydrated {
        Hydrated::Resource(resource) => Ok(resource),
        other => Err(shape_mismatch("resource", &other)),
    }
}

fn expect_collection(hydrated: Hydrated) -> Result<CollectionResource> {
    match hydrated {
        Hydrated::Collection(collection) => Ok(collection),
        Hydrated::PagedCollection(paged) => Ok(paged.into_collection()),
        other => Err(shape_mismatch("collection", &other)),
    }
}

fn expect_page(hydrated: Hydrated) -> Result<PagedCollectionResource> {
    match hydrated {
        Hydrated::PagedCollection(paged) => Ok(paged),
        other => Err(shape_mismatch("paged collection", &other)),
    }
}

fn shape_mismatch(expected: &str, got: &Hydrated) -> HalError {
    HydrationError::ShapeMismatch {
        shape: expected.to_string(),
        reason: format!("response hydrated as {}", got.shape()),
    }
    .into()
}
