//! HTTP client for the remote people catalog.
//!
//! This crate provides:
//! - Record and page envelope types as served by the catalog
//! - An HTTP client issuing "browse by page" and "search by term" requests
//! - A [`MockClient`] seeded with canned responses for tests
//!
//! ## Usage
//!
//! ```ignore
//! use faraway_catalog::{CatalogClient, CatalogClientConfig, ClientTrait, PageNumber};
//!
//! let client = CatalogClient::new(CatalogClientConfig::default())?;
//! let envelope = client.fetch_page(PageNumber::FIRST).await?;
//! ```

mod client;
mod config;
mod error;
mod mock;
mod types;

pub use client::{CatalogClient, Client, ClientTrait, SERVER_PAGE_SIZE};
pub use config::{CatalogClientConfig, DEFAULT_CATALOG_URL};
pub use error::CatalogClientError;
pub use mock::{CatalogRequest, MockClient, MockResponse};
pub use reqwest::StatusCode;
pub use types::{PageEnvelope, PageNumber, Person};
