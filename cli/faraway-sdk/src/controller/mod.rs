//! The search/browse controller.
//!
//! A [`Controller`] owns the [`ControllerState`] of one browsing session.
//! The presentation layer talks to it through a [`ControllerHandle`]: it
//! dispatches intents and reads [`Snapshot`]s, it never touches the state
//! directly.
//!
//! [`Controller::run`] processes one event at a time: intents from handles,
//! settled debounce timers and completed fetches. Fetches run concurrently
//! on the same task and are never canceled once issued, but only the result
//! of the most recently issued fetch is applied.
//!
//! ```ignore
//! let (controller, handle) = Controller::new(client, ControllerConfig::default());
//! tokio::join!(controller.run(), async move {
//!     handle.on_query_text_changed("Luke")?;
//!     // ...
//! });
//! ```

mod state;

use std::num::NonZeroU64;
use std::time::Duration;

use faraway_catalog::{ClientTrait, PageNumber, SERVER_PAGE_SIZE};
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
pub use state::{ControllerState, Effect, Event, FetchSeq, Snapshot};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, instrument};

use crate::utils::debounce::Debouncer;

/// How long the query has to stay unchanged before it is acted on.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Delay between the last query change and the resulting fetch.
    pub debounce: Duration,
    /// Records per page in the catalog's pagination scheme.
    pub page_size: NonZeroU64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            debounce: SEARCH_DEBOUNCE,
            page_size: SERVER_PAGE_SIZE,
        }
    }
}

/// Error returned when an intent can't be dispatched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    #[error("page numbers start at 1")]
    InvalidPage,
    #[error("controller is not running")]
    Closed,
}

#[derive(Debug)]
enum Intent {
    QueryTextChanged(String),
    PageSelected(PageNumber),
}

impl From<Intent> for Event {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::QueryTextChanged(text) => Event::QueryTextChanged(text),
            Intent::PageSelected(page) => Event::PageSelected(page),
        }
    }
}

/// The presentation layer's side of a [`Controller`].
///
/// The controller stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    intents: mpsc::UnboundedSender<Intent>,
    snapshot: watch::Receiver<Snapshot>,
}

impl ControllerHandle {
    /// The query text was edited.
    pub fn on_query_text_changed(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.send(Intent::QueryTextChanged(text.into()))
    }

    /// A page was selected by its number. Pages are 1-based.
    pub fn on_page_selected(&self, page: u32) -> Result<(), ControllerError> {
        let page = PageNumber::new(page).ok_or(ControllerError::InvalidPage)?;
        self.select_page(page)
    }

    /// Select `page`, e.g. one derived from [`Snapshot::current_page`].
    pub fn select_page(&self, page: PageNumber) -> Result<(), ControllerError> {
        self.send(Intent::PageSelected(page))
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.clone()
    }

    fn send(&self, intent: Intent) -> Result<(), ControllerError> {
        self.intents
            .send(intent)
            .map_err(|_| ControllerError::Closed)
    }
}

/// Drives a [`ControllerState`] against a catalog client.
#[derive(Debug)]
pub struct Controller<C> {
    client: C,
    config: ControllerConfig,
    intents: mpsc::UnboundedReceiver<Intent>,
    snapshot: watch::Sender<Snapshot>,
}

impl<C: ClientTrait> Controller<C> {
    pub fn new(client: C, config: ControllerConfig) -> (Self, ControllerHandle) {
        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(ControllerState::new(config.page_size).snapshot());

        let controller = Self {
            client,
            config,
            intents: intent_rx,
            snapshot: snapshot_tx,
        };
        let handle = ControllerHandle {
            intents: intent_tx,
            snapshot: snapshot_rx,
        };
        (controller, handle)
    }

    /// Mount the controller and process events until all handles are gone.
    ///
    /// Dropping this future, or returning from it, cancels a pending
    /// debounce timer and abandons fetches still in flight.
    #[instrument(name = "controller", skip_all)]
    pub async fn run(self) {
        let Controller {
            client,
            config,
            mut intents,
            snapshot,
        } = self;
        let client = &client;

        let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<String>();
        let mut debouncer = Debouncer::new(config.debounce);
        let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, Event>> = FuturesUnordered::new();

        let mut state = ControllerState::new(config.page_size);
        let mut event = Event::Mounted;

        loop {
            let (next, effects) = state.reduce(event);
            state = next;

            for effect in effects {
                match effect {
                    Effect::FetchPage { seq, page } => {
                        debug!(?seq, %page, "fetching page");
                        in_flight.push(
                            async move {
                                let result = client.fetch_page(page).await;
                                Event::FetchCompleted { seq, result }
                            }
                            .boxed_local(),
                        );
                    },
                    Effect::FetchSearch { seq, term } => {
                        debug!(?seq, %term, "searching");
                        in_flight.push(
                            async move {
                                let result = client.fetch_search(term).await;
                                Event::FetchCompleted { seq, result }
                            }
                            .boxed_local(),
                        );
                    },
                    Effect::ScheduleDebounce(text) => {
                        let settled_tx = settled_tx.clone();
                        debouncer.schedule(move || {
                            // The receiver is gone only after the controller stopped.
                            let _ = settled_tx.send(text);
                        });
                    },
                }
            }

            let next_snapshot = state.snapshot();
            snapshot.send_if_modified(|current| {
                if *current == next_snapshot {
                    return false;
                }
                *current = next_snapshot;
                true
            });

            event = tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => intent.into(),
                    None => break,
                },
                Some(text) = settled_rx.recv() => Event::DebounceSettled(text),
                Some(completed) = in_flight.next(), if !in_flight.is_empty() => completed,
            };
        }

        debouncer.cancel();
        debug!(abandoned_fetches = in_flight.len(), "controller stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use faraway_catalog::{CatalogRequest, MockClient, MockResponse, PageEnvelope, Person};
    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    use super::*;

    fn page(n: u32) -> PageNumber {
        PageNumber::new(n).unwrap()
    }

    fn envelope(names: &[&str]) -> PageEnvelope {
        PageEnvelope {
            count: 82,
            next: Some("https://swapi.dev/api/people/?page=2".to_string()),
            previous: None,
            results: names
                .iter()
                .map(|name| Person {
                    name: name.to_string(),
                    url: format!("https://swapi.dev/api/people/{name}/"),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn names(snapshot: &Snapshot) -> Vec<&str> {
        snapshot
            .records
            .iter()
            .map(|person| person.name.as_str())
            .collect()
    }

    /// Run a controller backed by `client` until `script` finishes.
    async fn run_with<F, Fut>(client: MockClient, script: F)
    where
        F: FnOnce(ControllerHandle) -> Fut,
        Fut: Future<Output = ()>,
    {
        let (controller, handle) = Controller::new(client, ControllerConfig::default());
        tokio::join!(controller.run(), script(handle));
    }

    #[tokio::test(start_paused = true)]
    async fn mount_fetches_first_page_once() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["Luke", "C-3PO"]));

        run_with(client.clone(), |handle| async move {
            sleep(Duration::from_secs(1)).await;
            let snapshot = handle.snapshot();
            assert_eq!(names(&snapshot), vec!["Luke", "C-3PO"]);
            assert!(!snapshot.is_loading);
            assert_eq!(snapshot.current_page, PageNumber::FIRST);
            assert_eq!(snapshot.pagination.page_count, 9);
        })
        .await;

        assert_eq!(client.requests(), vec![CatalogRequest::Page(PageNumber::FIRST)]);
    }

    #[tokio::test(start_paused = true)]
    async fn typing_then_clearing() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["Luke", "C-3PO"]));
        client.push_envelope(envelope(&["Luke Skywalker"]));
        client.push_envelope(envelope(&["Luke", "C-3PO"]));

        run_with(client.clone(), |handle| {
            let client = client.clone();
            async move {
                sleep(Duration::from_millis(10)).await;

                for text in ["L", "Lu", "Luk", "Luke"] {
                    handle.on_query_text_changed(text).unwrap();
                    sleep(Duration::from_millis(100)).await;
                }
                // Nothing but the mount fetch while typing.
                assert_eq!(client.requests(), vec![CatalogRequest::Page(page(1))]);

                sleep(Duration::from_millis(300)).await;
                assert_eq!(client.requests(), vec![
                    CatalogRequest::Page(page(1)),
                    CatalogRequest::Search("Luke".to_string()),
                ]);
                let snapshot = handle.snapshot();
                assert_eq!(names(&snapshot), vec!["Luke Skywalker"]);
                assert_eq!(snapshot.query_text, "Luke");

                handle.on_query_text_changed("").unwrap();
                sleep(SEARCH_DEBOUNCE + Duration::from_millis(1)).await;
                assert_eq!(client.requests(), vec![
                    CatalogRequest::Page(page(1)),
                    CatalogRequest::Search("Luke".to_string()),
                    CatalogRequest::Page(page(1)),
                ]);
                assert_eq!(names(&handle.snapshot()), vec!["Luke", "C-3PO"]);
            }
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_changes_fetch_once_for_last_term() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["Luke"]));
        client.push_envelope(envelope(&["abc"]));

        run_with(client.clone(), |handle| async move {
            for text in ["a", "ab", "abc"] {
                handle.on_query_text_changed(text).unwrap();
                sleep(Duration::from_millis(299)).await;
            }
            sleep(Duration::from_secs(1)).await;
        })
        .await;

        assert_eq!(client.requests(), vec![
            CatalogRequest::Page(page(1)),
            CatalogRequest::Search("abc".to_string()),
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn search_waits_for_debounce() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["Luke"]));
        client.push_envelope(envelope(&["Obi-Wan Kenobi"]));

        run_with(client.clone(), |handle| {
            let client = client.clone();
            async move {
                handle.on_query_text_changed("Obi").unwrap();
                sleep(SEARCH_DEBOUNCE - Duration::from_millis(1)).await;
                assert_eq!(client.requests().len(), 1);

                sleep(Duration::from_millis(2)).await;
                assert_eq!(client.requests()[1], CatalogRequest::Search("Obi".to_string()));
            }
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_term_is_not_sent() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["Luke"]));

        run_with(client.clone(), |handle| async move {
            handle.on_query_text_changed("Padmé").unwrap();
            sleep(Duration::from_secs(1)).await;

            let snapshot = handle.snapshot();
            assert_eq!(snapshot.query_text, "Padmé");
            assert_eq!(names(&snapshot), vec!["Luke"]);
            assert!(!snapshot.is_loading);
        })
        .await;

        assert_eq!(client.requests(), vec![CatalogRequest::Page(page(1))]);
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_pages_fetches_each_once() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["page 1"]));
        for n in [2, 5, 9] {
            client.push_envelope(envelope(&[&format!("page {n}")]));
        }

        run_with(client.clone(), |handle| async move {
            for n in [2, 5, 9] {
                handle.on_page_selected(n).unwrap();
                sleep(Duration::from_millis(10)).await;

                let snapshot = handle.snapshot();
                assert_eq!(snapshot.current_page, page(n));
                assert_eq!(names(&snapshot), vec![format!("page {n}")]);
            }
        })
        .await;

        assert_eq!(client.requests(), vec![
            CatalogRequest::Page(page(1)),
            CatalogRequest::Page(page(2)),
            CatalogRequest::Page(page(5)),
            CatalogRequest::Page(page(9)),
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_keeps_displayed_records() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["Luke"]));
        client.push_error_response(500);

        run_with(client.clone(), |handle| async move {
            sleep(Duration::from_millis(10)).await;
            let before = handle.snapshot();

            handle.on_page_selected(2).unwrap();
            sleep(Duration::from_millis(10)).await;

            let after = handle.snapshot();
            assert!(!after.is_loading);
            assert_eq!(after.records, before.records);
            assert_eq!(after.pagination, before.pagination);
            assert_eq!(after.current_page, page(2));
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_search_response_keeps_displayed_records() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["Luke"]));
        client.push_response(MockResponse::Malformed("<html>maintenance</html>".to_string()));

        run_with(client.clone(), |handle| async move {
            sleep(Duration::from_millis(10)).await;
            let before = handle.snapshot();

            handle.on_query_text_changed("Leia").unwrap();
            sleep(SEARCH_DEBOUNCE + Duration::from_millis(10)).await;

            let after = handle.snapshot();
            assert!(!after.is_loading);
            assert_eq!(after.records, before.records);
            assert_eq!(after.pagination, before.pagination);
            assert_eq!(after.current_page, before.current_page);
            assert_eq!(after.query_text, "Leia");
        })
        .await;

        assert_eq!(client.requests(), vec![
            CatalogRequest::Page(page(1)),
            CatalogRequest::Search("Leia".to_string()),
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_next_page_from_snapshot() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["page 1"]));
        client.push_envelope(envelope(&["page 2"]));

        run_with(client.clone(), |handle| async move {
            sleep(Duration::from_millis(10)).await;
            let current = handle.snapshot().current_page;
            handle.select_page(current.next()).unwrap();
            sleep(Duration::from_millis(10)).await;

            let snapshot = handle.snapshot();
            assert_eq!(snapshot.current_page, page(2));
            assert_eq!(names(&snapshot), vec!["page 2"]);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_earlier_fetch_does_not_overwrite_later_one() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["page 1"]));
        client.push_delayed_envelope(envelope(&["page 2"]), Duration::from_millis(500));
        client.push_delayed_envelope(envelope(&["page 3"]), Duration::from_millis(10));

        run_with(client.clone(), |handle| async move {
            sleep(Duration::from_millis(10)).await;
            handle.on_page_selected(2).unwrap();
            handle.on_page_selected(3).unwrap();

            sleep(Duration::from_millis(100)).await;
            let snapshot = handle.snapshot();
            assert_eq!(names(&snapshot), vec!["page 3"]);
            // The page 2 request is still in flight but superseded.
            assert!(!snapshot.is_loading);

            sleep(Duration::from_secs(1)).await;
            assert_eq!(names(&handle.snapshot()), vec!["page 3"]);
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn loading_is_published_while_fetching() {
        let client = MockClient::new();
        client.push_delayed_envelope(envelope(&["Luke"]), Duration::from_millis(200));

        let start = tokio::time::Instant::now();
        run_with(client.clone(), |handle| async move {
            sleep(Duration::from_millis(100)).await;
            assert!(handle.snapshot().is_loading);

            let mut updates = handle.subscribe();
            let snapshot = updates
                .wait_for(|snapshot| !snapshot.is_loading)
                .await
                .unwrap()
                .clone();
            assert_eq!(names(&snapshot), vec!["Luke"]);
            assert!(tokio::time::Instant::now() - start >= Duration::from_millis(200));
        })
        .await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handles_cancels_pending_search() {
        let client = MockClient::new();
        client.push_envelope(envelope(&["Luke"]));

        run_with(client.clone(), |handle| async move {
            sleep(Duration::from_millis(10)).await;
            handle.on_query_text_changed("Leia").unwrap();
        })
        .await;

        sleep(Duration::from_secs(1)).await;
        assert_eq!(client.requests(), vec![CatalogRequest::Page(page(1))]);
    }

    #[test]
    fn page_zero_is_rejected() {
        let (_controller, handle) = Controller::new(MockClient::new(), ControllerConfig::default());
        assert_eq!(handle.on_page_selected(0), Err(ControllerError::InvalidPage));
    }

    #[test]
    fn intents_fail_once_controller_is_gone() {
        let (controller, handle) = Controller::new(MockClient::new(), ControllerConfig::default());
        drop(controller);
        assert_eq!(
            handle.on_query_text_changed("Luke"),
            Err(ControllerError::Closed)
        );
    }
}
