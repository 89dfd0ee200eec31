use std::io::IsTerminal;

use anyhow::{Context, Result};
use bpaf::Bpaf;
use faraway_catalog::PageNumber;
use faraway_sdk::controller::{Controller, ControllerError, ControllerHandle, Snapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, instrument};

use super::init_catalog_client;
use crate::config::Config;
use crate::utils::{message, render};

// Browse and search people interactively
#[derive(Debug, Bpaf, Clone, Default)]
pub struct Interactive {
    /// The page to start on
    #[bpaf(long, argument("N"))]
    pub page: Option<u32>,
}

/// A line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    /// Anything that isn't a command is the new query text.
    Query(String),
    Page(u32),
    Next,
    Previous,
    Quit,
}

impl Input {
    fn parse(line: &str) -> Result<Input, String> {
        let Some(command) = line.strip_prefix(':') else {
            return Ok(Input::Query(line.to_string()));
        };

        let mut words = command.split_whitespace();
        let input = match (words.next(), words.next(), words.next()) {
            (Some("page"), Some(n), None) => n
                .parse()
                .map(Input::Page)
                .map_err(|_| format!("'{n}' is not a page number"))?,
            (Some("next"), None, None) => Input::Next,
            (Some("prev"), None, None) => Input::Previous,
            (Some("quit"), None, None) => Input::Quit,
            _ => return Err(format!("unknown command ':{command}'")),
        };
        Ok(input)
    }
}

impl Interactive {
    #[instrument(name = "interactive", skip_all)]
    pub async fn handle(self, config: Config) -> Result<()> {
        let client = init_catalog_client(&config)?;
        let (controller, handle) = Controller::new(client, config.controller_config());

        let (_, session) = tokio::join!(controller.run(), self.session(handle));
        session
    }

    /// Render every snapshot and dispatch stdin lines until `:quit` or EOF.
    ///
    /// Returning drops the handle, which unmounts the controller.
    async fn session(self, handle: ControllerHandle) -> Result<()> {
        if let Some(page) = self.page {
            let page = PageNumber::new(page).ok_or(ControllerError::InvalidPage)?;
            handle.select_page(page)?;
        }

        let clear = std::io::stdout().is_terminal();
        let mut stdout = std::io::stdout();
        let mut updates = handle.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        render::draw(&mut stdout, &updates.borrow_and_update(), clear)?;

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        debug!("controller stopped");
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    render::draw(&mut stdout, &snapshot, clear)?;
                },
                line = lines.next_line() => {
                    let Some(line) = line.context("failed to read from stdin")? else {
                        debug!("stdin closed");
                        break;
                    };

                    match Input::parse(line.trim_end()) {
                        Ok(Input::Quit) => break,
                        Ok(input) => dispatch(&handle, input)?,
                        Err(err) => message::warning(err),
                    }
                },
            }
        }
        Ok(())
    }
}

/// What a line of input asks the controller to do, given the latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    ChangeQuery(String),
    SelectPage(PageNumber),
    /// Nothing to dispatch, tell the user why.
    Notice(&'static str),
}

impl Action {
    fn plan(snapshot: &Snapshot, input: Input) -> Option<Action> {
        let action = match input {
            // Like a disabled search field, queries wait for the current fetch.
            Input::Query(_) if snapshot.is_loading => {
                Action::Notice("Still loading, enter the query again once results are shown.")
            },
            Input::Query(text) => Action::ChangeQuery(text),
            Input::Page(page) => match PageNumber::new(page) {
                Some(page) => Action::SelectPage(page),
                None => Action::Notice("Page numbers start at 1."),
            },
            Input::Next if snapshot.pagination.has_next => {
                Action::SelectPage(snapshot.current_page.next())
            },
            Input::Previous if snapshot.pagination.has_previous => {
                match snapshot.current_page.previous() {
                    Some(page) => Action::SelectPage(page),
                    None => Action::Notice("There is no previous page."),
                }
            },
            Input::Next => Action::Notice("There is no next page."),
            Input::Previous => Action::Notice("There is no previous page."),
            Input::Quit => return None,
        };
        Some(action)
    }
}

fn dispatch(handle: &ControllerHandle, input: Input) -> Result<()> {
    match Action::plan(&handle.snapshot(), input) {
        Some(Action::ChangeQuery(text)) => handle.on_query_text_changed(text)?,
        Some(Action::SelectPage(page)) => handle.select_page(page)?,
        Some(Action::Notice(notice)) => message::warning(notice),
        None => {},
    }
    Ok(())
}
