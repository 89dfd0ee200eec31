//! Catalog client issuing page and search requests.

use std::fmt::Debug;
use std::num::NonZeroU64;
use std::str::FromStr;

use enum_dispatch::enum_dispatch;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogClientConfig;
use crate::error::CatalogClientError;
use crate::mock::MockClient;
use crate::types::{PageEnvelope, PageNumber};

/// Number of records the catalog puts on one page.
///
/// The catalog decides this on its own, it is not sent with requests.
pub const SERVER_PAGE_SIZE: NonZeroU64 = NonZeroU64::new(10).unwrap();

const USER_AGENT: &str = concat!("faraway/", env!("CARGO_PKG_VERSION"));

/// Either a client for the actual catalog service,
/// or a mock client for testing.
#[derive(Debug)]
#[enum_dispatch(ClientTrait)]
pub enum Client {
    Catalog(CatalogClient),
    Mock(MockClient),
}

/// The catalog operations the controller relies on.
#[enum_dispatch]
#[allow(async_fn_in_trait)]
pub trait ClientTrait {
    /// Fetch the records on the given page.
    async fn fetch_page(&self, page: PageNumber) -> Result<PageEnvelope, CatalogClientError>;

    /// Fetch the records matching a free-text term.
    ///
    /// Matching and page size are up to the catalog.
    async fn fetch_search(
        &self,
        term: impl AsRef<str> + Send + Sync,
    ) -> Result<PageEnvelope, CatalogClientError>;
}

/// A client for the catalog service.
///
/// Every call is a single GET without retries or timeouts.
pub struct CatalogClient {
    client: reqwest::Client,
    people_url: Url,
}

impl Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("people_url", &self.people_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CatalogClient {
    /// Create a new catalog client from configuration.
    pub fn new(config: CatalogClientConfig) -> Result<Self, CatalogClientError> {
        let people_url = people_url(&config.catalog_url)?;
        let client = build_http_client(&config)?;
        debug!(%people_url, "created catalog client");

        Ok(Self { client, people_url })
    }

    fn page_url(&self, page: PageNumber) -> Url {
        let mut url = self.people_url.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());
        url
    }

    fn search_url(&self, term: &str) -> Url {
        let mut url = self.people_url.clone();
        url.query_pairs_mut().append_pair("search", term);
        url
    }

    async fn get_envelope(&self, url: Url) -> Result<PageEnvelope, CatalogClientError> {
        let url_string = url.to_string();

        let response = self.client.get(url).send().await.map_err(|source| {
            CatalogClientError::Network {
                url: url_string.clone(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogClientError::Server {
                url: url_string,
                status,
            });
        }

        // Read the body first so that decoding failures are reported as
        // parse errors rather than transport errors.
        let body = response
            .bytes()
            .await
            .map_err(|source| CatalogClientError::Network {
                url: url_string.clone(),
                source,
            })?;

        let envelope: PageEnvelope =
            serde_json::from_slice(&body).map_err(|source| CatalogClientError::Parse {
                url: url_string,
                source,
            })?;

        debug!(
            count = envelope.count,
            n_results = envelope.results.len(),
            "received page envelope"
        );
        Ok(envelope)
    }
}

impl ClientTrait for CatalogClient {
    #[instrument(skip_all, fields(%page))]
    async fn fetch_page(&self, page: PageNumber) -> Result<PageEnvelope, CatalogClientError> {
        debug!("sending page request");
        self.get_envelope(self.page_url(page)).await
    }

    #[instrument(skip_all, fields(term = term.as_ref()))]
    async fn fetch_search(
        &self,
        term: impl AsRef<str> + Send + Sync,
    ) -> Result<PageEnvelope, CatalogClientError> {
        debug!("sending search request");
        self.get_envelope(self.search_url(term.as_ref())).await
    }
}

/// `{catalog_url}/people/`, tolerating a trailing slash on the base.
fn people_url(catalog_url: &str) -> Result<Url, CatalogClientError> {
    let people = format!("{}/people/", catalog_url.trim_end_matches('/'));
    Url::parse(&people).map_err(|source| CatalogClientError::InvalidUrl {
        url: catalog_url.to_string(),
        source,
    })
}

fn build_http_client(config: &CatalogClientConfig) -> Result<reqwest::Client, CatalogClientError> {
    let mut header_map = HeaderMap::new();

    for (key, value) in &config.extra_headers {
        let invalid = || CatalogClientError::InvalidHeader { name: key.clone() };
        let name = HeaderName::from_str(key).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        header_map.insert(name, value);
    }

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(header_map)
        .build()
        .map_err(CatalogClientError::BuildClient)
}
