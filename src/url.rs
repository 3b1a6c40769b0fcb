//! URL building and query-parameter serialization.
//!
//! Helper functions consumed by the dispatcher as a black-box utility layer:
//!
//! | Function | Purpose |
//! |----------|---------|
//! | [`validate_base_url`] | check the configured base API URL once |
//! | [`build_resource_url`] | `base + resource name + query path` |
//! | [`serialize_options`] | [`QueryOptions`] → transport parameter pairs |
//! | [`strip_template_vars`] | drop `{...}` template expressions from hrefs |
//!
//! Parameter serialization is deterministic: free-form parameters are emitted
//! in key order, the fixed options in a fixed order, and `sort` entries in
//! declaration order as repeated `sort=field,ORDER` pairs. The cache relies
//! on this to build stable request keys.

use crate::error::{HalError, Result};
use crate::types::QueryOptions;
use regex::Regex;
use std::sync::OnceLock;

/// Serialized transport parameters. A pair list rather than a map because
/// `sort` may repeat.
pub type Params = Vec<(String, String)>;

fn template_vars() -> &'static Regex {
    static TEMPLATE_VARS: OnceLock<Regex> = OnceLock::new();
    TEMPLATE_VARS.get_or_init(|| Regex::new(r"\{[^{}]*\}").expect("template-var pattern is valid"))
}

/// Validate a base API URL, rejecting empty or unparseable values.
///
/// # Errors
///
/// Returns [`HalError::Configuration`] when the URL is empty or invalid.
pub fn validate_base_url(base: &str) -> Result<()> {
    if base.trim().is_empty() {
        return Err(HalError::Configuration(
            "base api url should be defined".to_string(),
        ));
    }
    url::Url::parse(base)
        .map_err(|e| HalError::Configuration(format!("invalid base api url '{}': {}", base, e)))?;
    Ok(())
}

/// Build the absolute URL for a resource query.
///
/// Joins `base`, `resource_name` and `path` with single slashes, tolerating
/// stray slashes on any of the pieces. An empty `path` yields the resource
/// root URL.
///
/// # Examples
///
/// ```
/// use hal_client::url::build_resource_url;
///
/// let url = build_resource_url("http://localhost/api/", "orders", "/search/open");
/// assert_eq!(url, "http://localhost/api/orders/search/open");
/// ```
pub fn build_resource_url(base: &str, resource_name: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = resource_name.trim_matches('/');
    let path = path.trim_matches('/');
    if path.is_empty() {
        format!("{}/{}", base, name)
    } else {
        format!("{}/{}/{}", base, name, path)
    }
}

/// Remove RFC 6570-style template expressions from a link href.
///
/// HAL servers advertise templated links such as
/// `http://host/api/orders{?page,size,sort}`; the un-expanded variables must
/// be stripped before the href can be fetched.
///
/// # Examples
///
/// ```
/// use hal_client::url::strip_template_vars;
///
/// let href = "http://localhost/api/orders{?projection}";
/// assert_eq!(strip_template_vars(href), "http://localhost/api/orders");
/// ```
pub fn strip_template_vars(href: &str) -> String {
    template_vars().replace_all(href, "").into_owned()
}

/// Serialize query options into transport parameters.
///
/// Emission order: free-form params (key order), `include`, `projection`,
/// `page`, `size`, then each `sort` entry as `field,ORDER`. `None` options
/// are skipped; `None` input serializes to an empty list.
pub fn serialize_options(options: Option<&QueryOptions>) -> Params {
    let mut params = Params::new();
    let Some(options) = options else {
        return params;
    };

    for (key, value) in &options.params {
        params.push((key.clone(), value.clone()));
    }
    if let Some(include) = &options.include {
        params.push(("include".to_string(), include.clone()));
    }
    if let Some(projection) = &options.projection {
        params.push(("projection".to_string(), projection.clone()));
    }
    if let Some(page) = options.page {
        params.push(("page".to_string(), page.to_string()));
    }
    if let Some(size) = options.size {
        params.push(("size".to_string(), size.to_string()));
    }
    for sort in &options.sort {
        params.push((
            "sort".to_string(),
            format!("{},{}", sort.field, sort.order.as_str()),
        ));
    }

    params
}
