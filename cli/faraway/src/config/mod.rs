use std::collections::BTreeMap;
use std::env;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config as HierarchicalConfig, Environment};
use faraway_catalog::{DEFAULT_CATALOG_URL, SERVER_PAGE_SIZE};
use faraway_sdk::controller::{ControllerConfig, SEARCH_DEBOUNCE};
use serde::{Deserialize, Serialize};
use tracing::debug;
use xdg::BaseDirectories;

/// Name of the faraway config directory
const FARAWAY_DIR_NAME: &str = "faraway";
const FARAWAY_CONFIG_DIR_VAR: &str = "FARAWAY_CONFIG_DIR";
const FARAWAY_ENV_PREFIX: &str = "FARAWAY";
pub const FARAWAY_CONFIG_FILE: &str = "faraway.toml";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the people catalog
    pub catalog_url: String,
    /// Milliseconds the query has to stay unchanged before it is searched
    pub search_debounce_ms: u64,
    /// Records per page served by the catalog
    pub page_size: NonZeroU64,
    /// Additional headers sent with every catalog request
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            search_debounce_ms: SEARCH_DEBOUNCE.as_millis() as u64,
            page_size: SERVER_PAGE_SIZE,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Creates a [Config] from the environment and config files
    ///
    /// Files are read from the XDG config dirs, then from
    /// `$FARAWAY_CONFIG_DIR`, then `FARAWAY_*` variables override them.
    pub fn parse() -> Result<Config> {
        let config_files = match env::var(FARAWAY_CONFIG_DIR_VAR) {
            Ok(dir) => {
                debug!("`${FARAWAY_CONFIG_DIR_VAR}` set: {dir}");
                vec![PathBuf::from(dir).join(FARAWAY_CONFIG_FILE)]
            },
            Err(_) => {
                let faraway_dirs = BaseDirectories::with_prefix(FARAWAY_DIR_NAME);
                // xdg yields the user's file first, it has to be layered last
                let mut files: Vec<_> = faraway_dirs.find_config_files(FARAWAY_CONFIG_FILE).collect();
                files.reverse();
                debug!("`${FARAWAY_CONFIG_DIR_VAR}` not set, found config files: {files:?}");
                files
            },
        };

        Self::parse_from(&config_files)
    }

    /// Layer the defaults, the given files (later files win) and the
    /// environment.
    ///
    /// Missing files are skipped.
    fn parse_from(config_files: &[impl AsRef<Path>]) -> Result<Config> {
        let defaults = Config::default();

        let mut builder = HierarchicalConfig::builder()
            .set_default("catalog_url", defaults.catalog_url)?
            .set_default("search_debounce_ms", defaults.search_debounce_ms)?
            .set_default("page_size", defaults.page_size.get())?;

        for file in config_files {
            builder = builder.add_source(
                config::File::from(file.as_ref())
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        // override via env variables
        let builder = builder.add_source(
            Environment::with_prefix(FARAWAY_ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true),
        );

        builder
            .build()?
            .try_deserialize()
            .context("Could not parse config")
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            debounce: Duration::from_millis(self.search_debounce_ms),
            page_size: self.page_size,
        }
    }
}
