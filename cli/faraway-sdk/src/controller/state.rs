//! Controller state and its transitions.
//!
//! [`ControllerState::reduce`] takes one [`Event`] and returns the next
//! state together with the [`Effect`]s the runtime has to carry out.
//! No I/O happens here.

use std::num::NonZeroU64;

use faraway_catalog::{CatalogClientError, PageEnvelope, PageNumber, Person, SERVER_PAGE_SIZE};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::pagination::PaginationView;
use crate::models::search_term::QueryIntent;

/// Tag of an issued fetch. Later fetches have larger tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchSeq(u64);

impl FetchSeq {
    fn next(self) -> Self {
        FetchSeq(self.0 + 1)
    }
}

/// Something that happened to the controller.
#[derive(Debug)]
pub enum Event {
    /// The screen was mounted.
    Mounted,
    /// The user picked a page.
    PageSelected(PageNumber),
    /// The user edited the query.
    QueryTextChanged(String),
    /// The query stayed unchanged for the debounce delay.
    DebounceSettled(String),
    /// A fetch finished.
    FetchCompleted {
        seq: FetchSeq,
        result: Result<PageEnvelope, CatalogClientError>,
    },
}

/// Work requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchPage { seq: FetchSeq, page: PageNumber },
    FetchSearch { seq: FetchSeq, term: String },
    /// (Re)start the debounce timer for this query text.
    ScheduleDebounce(String),
}

/// The read-only view handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub records: Vec<Person>,
    pub pagination: PaginationView,
    pub is_loading: bool,
    pub query_text: String,
    pub current_page: PageNumber,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    query_text: String,
    current_page: PageNumber,
    is_loading: bool,
    last_envelope: Option<PageEnvelope>,
    /// Tag of the most recently issued fetch.
    latest_fetch: FetchSeq,
    page_size: NonZeroU64,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(SERVER_PAGE_SIZE)
    }
}

impl ControllerState {
    pub fn new(page_size: NonZeroU64) -> Self {
        Self {
            query_text: String::new(),
            current_page: PageNumber::FIRST,
            is_loading: false,
            last_envelope: None,
            latest_fetch: FetchSeq::default(),
            page_size,
        }
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn current_page(&self) -> PageNumber {
        self.current_page
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_envelope(&self) -> Option<&PageEnvelope> {
        self.last_envelope.as_ref()
    }

    pub fn pagination(&self) -> PaginationView {
        PaginationView::derive(self.last_envelope.as_ref(), self.page_size)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            records: self
                .last_envelope
                .as_ref()
                .map(|envelope| envelope.results.clone())
                .unwrap_or_default(),
            pagination: self.pagination(),
            is_loading: self.is_loading,
            query_text: self.query_text.clone(),
            current_page: self.current_page,
        }
    }

    /// Apply `event`, returning the new state and the effects to run.
    pub fn reduce(mut self, event: Event) -> (Self, Vec<Effect>) {
        let effects = match event {
            Event::Mounted => vec![self.browse()],
            Event::PageSelected(page) => {
                if page == self.current_page {
                    debug!(%page, "page already selected");
                    vec![]
                } else {
                    self.current_page = page;
                    vec![self.browse()]
                }
            },
            Event::QueryTextChanged(text) => {
                if text == self.query_text {
                    vec![]
                } else {
                    self.query_text = text.clone();
                    vec![Effect::ScheduleDebounce(text)]
                }
            },
            Event::DebounceSettled(text) => {
                if text != self.query_text {
                    debug!(settled = %text, current = %self.query_text, "ignoring stale query");
                    vec![]
                } else {
                    match QueryIntent::from_query(&text) {
                        QueryIntent::Browse => vec![self.browse()],
                        QueryIntent::Search(term) => vec![self.search(term)],
                        QueryIntent::Rejected => {
                            debug!(query = %text, "not searching for invalid term");
                            vec![]
                        },
                    }
                }
            },
            Event::FetchCompleted { seq, result } => {
                self.complete(seq, result);
                vec![]
            },
        };

        (self, effects)
    }

    fn issue(&mut self) -> FetchSeq {
        self.latest_fetch = self.latest_fetch.next();
        self.is_loading = true;
        self.latest_fetch
    }

    fn browse(&mut self) -> Effect {
        let seq = self.issue();
        Effect::FetchPage {
            seq,
            page: self.current_page,
        }
    }

    fn search(&mut self, term: String) -> Effect {
        let seq = self.issue();
        Effect::FetchSearch { seq, term }
    }

    fn complete(&mut self, seq: FetchSeq, result: Result<PageEnvelope, CatalogClientError>) {
        // A newer fetch is in flight, its result is the one to show.
        if seq != self.latest_fetch {
            debug!(?seq, latest = ?self.latest_fetch, "discarding superseded fetch result");
            return;
        }

        self.is_loading = false;
        match result {
            Ok(envelope) => {
                debug!(
                    count = envelope.count,
                    n_results = envelope.results.len(),
                    "loaded page"
                );
                self.last_envelope = Some(envelope);
            },
            Err(err) => {
                warn!(error = %display_chain(&err), "fetching from catalog failed, keeping previous results");
            },
        }
    }
}

/// `err: cause: cause` on a single line.
fn display_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
