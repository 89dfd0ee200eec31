//! Error handling for catalog operations.

use reqwest::StatusCode;
use thiserror::Error;

/// Common error type for catalog operations.
///
/// `Network`, `Server` and `Parse` are the failures a single request can end
/// in. The remaining variants can only occur while building a client.
#[derive(Debug, Error)]
pub enum CatalogClientError {
    #[error("invalid catalog url '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },
    #[error("could not create http client")]
    BuildClient(#[source] reqwest::Error),

    /// The request could not complete.
    #[error("request to '{url}' failed")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The catalog answered with a non-success status.
    #[error("catalog responded with {status} for '{url}'")]
    Server { url: String, status: StatusCode },
    /// The body was not a page envelope.
    #[error("could not parse catalog response from '{url}'")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}
