//! Configuration types for catalog client construction.

use std::collections::BTreeMap;

/// Base URL of the public people catalog.
pub const DEFAULT_CATALOG_URL: &str = "https://swapi.dev/api";

/// Configuration for catalog client construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API, without the `/people/` resource.
    // Kept as a String, parsing into a `Url` happens when the client is built.
    pub catalog_url: String,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            extra_headers: BTreeMap::new(),
        }
    }
}
