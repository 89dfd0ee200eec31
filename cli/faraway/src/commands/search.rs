use anyhow::{Context, Result, bail};
use bpaf::Bpaf;
use faraway_catalog::{ClientTrait, PageNumber};
use faraway_sdk::models::search_term::{MAX_SEARCH_TERM_LEN, is_valid_search_term};
use indoc::formatdoc;
use tracing::{debug, instrument};

use super::init_catalog_client;
use crate::config::Config;
use crate::utils::render;

// Search people by name
#[derive(Debug, Bpaf, Clone)]
pub struct Search {
    /// Display search results as JSON
    #[bpaf(long)]
    pub json: bool,

    /// The name, or part of a name, to search for
    #[bpaf(positional("search-term"))]
    pub search_term: String,
}

impl Search {
    #[instrument(name = "search", fields(json = self.json, search_term = self.search_term), skip_all)]
    pub async fn handle(self, config: Config) -> Result<()> {
        if !is_valid_search_term(&self.search_term) {
            bail!(formatdoc! {"
                invalid search term '{term}'
                Search terms are 1 to {max} characters: ASCII letters, digits, spaces and common punctuation.",
                term = self.search_term,
                max = MAX_SEARCH_TERM_LEN,
            });
        }

        debug!("performing search for term: {}", self.search_term);
        let client = init_catalog_client(&config)?;
        let envelope = client
            .fetch_search(&self.search_term)
            .await
            .context("search failed")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        } else {
            println!(
                "{}",
                render::envelope(&envelope, PageNumber::FIRST, config.page_size)
            );
        }
        Ok(())
    }
}
