//! A catalog client that can be seeded with mock responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;

use crate::client::ClientTrait;
use crate::error::CatalogClientError;
use crate::types::{PageEnvelope, PageNumber};

// Arc allows you to push things into the client from outside the client,
// e.g. after it was moved into a controller.
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

/// A request received by a [`MockClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRequest {
    Page(PageNumber),
    Search(String),
}

/// A canned answer to the next request.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Envelope(PageEnvelope),
    /// Respond with a non-success status.
    Status(u16),
    /// Respond with a body that is not a page envelope.
    Malformed(String),
    /// Wait before producing the inner response.
    Delayed(Duration, Box<MockResponse>),
}

/// A catalog client answering from a queue of [`MockResponse`]s.
///
/// Clones share the same queue and request log.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    pub mock_responses: MockField<VecDeque<MockResponse>>,
    pub requests: MockField<Vec<CatalogRequest>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new response into the list of mock responses
    pub fn push_response(&self, resp: MockResponse) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(resp);
    }

    /// Push a successful page envelope
    pub fn push_envelope(&self, envelope: PageEnvelope) {
        self.push_response(MockResponse::Envelope(envelope));
    }

    /// Push a non-success status
    pub fn push_error_response(&self, status: u16) {
        self.push_response(MockResponse::Status(status));
    }

    /// Push an envelope that is only returned after `delay`
    pub fn push_delayed_envelope(&self, envelope: PageEnvelope, delay: Duration) {
        self.push_response(MockResponse::Delayed(
            delay,
            Box::new(MockResponse::Envelope(envelope)),
        ));
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<CatalogRequest> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }

    /// Number of responses that have not been consumed yet.
    pub fn remaining_responses(&self) -> usize {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .len()
    }

    async fn respond(&self, request: CatalogRequest) -> Result<PageEnvelope, CatalogClientError> {
        let url = match &request {
            CatalogRequest::Page(page) => format!("mock://people/?page={page}"),
            CatalogRequest::Search(term) => format!("mock://people/?search={term}"),
        };

        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(request);

        let mock_resp = self
            .mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front();

        let mut mock_resp = match mock_resp {
            Some(resp) => resp,
            None => panic!("no mock response left for request to '{url}'"),
        };

        loop {
            match mock_resp {
                MockResponse::Envelope(envelope) => return Ok(envelope),
                MockResponse::Status(status) => {
                    return Err(CatalogClientError::Server {
                        url,
                        status: StatusCode::from_u16(status).expect("invalid mock status code"),
                    });
                },
                MockResponse::Malformed(body) => {
                    let source = serde_json::from_str::<PageEnvelope>(&body)
                        .expect_err("malformed mock body parsed as an envelope");
                    return Err(CatalogClientError::Parse { url, source });
                },
                MockResponse::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    mock_resp = *inner;
                },
            }
        }
    }
}

impl ClientTrait for MockClient {
    async fn fetch_page(&self, page: PageNumber) -> Result<PageEnvelope, CatalogClientError> {
        self.respond(CatalogRequest::Page(page)).await
    }

    async fn fetch_search(
        &self,
        term: impl AsRef<str> + Send + Sync,
    ) -> Result<PageEnvelope, CatalogClientError> {
        self.respond(CatalogRequest::Search(term.as_ref().to_string()))
            .await
    }
}
