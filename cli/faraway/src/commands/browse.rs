use anyhow::{Context, Result};
use bpaf::Bpaf;
use faraway_catalog::{ClientTrait, PageNumber};
use tracing::instrument;

use super::init_catalog_client;
use crate::config::Config;
use crate::utils::render;

// Print one page of people
#[derive(Debug, Bpaf, Clone)]
pub struct Browse {
    /// Display the page as JSON
    #[bpaf(long)]
    pub json: bool,

    /// The page to print, starting at 1
    #[bpaf(long, argument("N"), fallback(1))]
    pub page: u32,
}

impl Browse {
    #[instrument(name = "browse", fields(json = self.json, page = self.page), skip_all)]
    pub async fn handle(self, config: Config) -> Result<()> {
        let page = PageNumber::new(self.page).context("page numbers start at 1")?;

        let client = init_catalog_client(&config)?;
        let envelope = client
            .fetch_page(page)
            .await
            .with_context(|| format!("failed to fetch page {page}"))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        } else {
            println!(
                "{}",
                render::envelope(&envelope, page, config.page_size)
            );
        }
        Ok(())
    }
}
