mod browse;
mod interactive;
mod search;

use std::fmt;

use anyhow::Result;
use bpaf::Bpaf;
use faraway_catalog::{CatalogClient, CatalogClientConfig, Client};
use indoc::indoc;
use tracing::debug;

use crate::config::Config;

const FARAWAY_DESCRIPTION: &str = indoc! {"
    Browse and search the people of a galaxy far, far away.

    Without a command, faraway starts an interactive session:
    type to search by name, or use ':page N', ':next', ':prev' and ':quit'."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(FARAWAY_DESCRIPTION))]
pub struct FarawayCli(#[bpaf(external(faraway_args))] pub FarawayArgs);

/// Main faraway args parser
///
/// To parse the faraway CLI, use [`FarawayCli`] instead using [`faraway_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct FarawayArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    /// Base URL of the people catalog, overrides the configured one
    #[bpaf(long, argument("URL"))]
    pub catalog_url: Option<String>,

    #[bpaf(external(commands), optional)]
    command: Option<Commands>,
}

impl FarawayArgs {
    pub async fn handle(self, mut config: Config) -> Result<()> {
        if let Some(catalog_url) = self.catalog_url {
            debug!(%catalog_url, "catalog url set on the command line");
            config.catalog_url = catalog_url;
        }

        match self.command.unwrap_or_default() {
            Commands::Interactive(args) => args.handle(config).await,
            Commands::Browse(args) => args.handle(config).await,
            Commands::Search(args) => args.handle(config).await,
        }
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Browse and search people interactively (default)
    #[bpaf(command)]
    Interactive(#[bpaf(external(interactive::interactive))] interactive::Interactive),

    /// Print one page of people
    #[bpaf(command)]
    Browse(#[bpaf(external(browse::browse))] browse::Browse),

    /// Search people by name
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Interactive(interactive::Interactive::default())
    }
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

/// Initialize the catalog client from the configuration
pub fn init_catalog_client(config: &Config) -> Result<Client> {
    debug!("using catalog client with url: {}", config.catalog_url);
    let client = CatalogClient::new(CatalogClientConfig {
        catalog_url: config.catalog_url.clone(),
        extra_headers: config.extra_headers.clone(),
    })?;
    Ok(client.into())
}

#[cfg(test)]
mod tests {
    use bpaf::Args;
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(args: &[&str]) -> FarawayArgs {
        let FarawayCli(args) = faraway_cli()
            .run_inner(Args::from(args))
            .expect("arguments should parse");
        args
    }

    #[test]
    fn no_command_is_interactive() {
        let args = parse(&[]);
        assert_eq!(args.verbosity, Verbosity::Verbose(0));
        assert!(matches!(
            args.command.unwrap_or_default(),
            Commands::Interactive(_)
        ));
    }

    #[test]
    fn verbosity_flags_are_counted() {
        assert_eq!(parse(&["-vv", "browse"]).verbosity, Verbosity::Verbose(2));
        assert_eq!(parse(&["-q", "browse"]).verbosity, Verbosity::Quiet);
    }

    #[test]
    fn catalog_url_flag() {
        let args = parse(&["--catalog-url", "http://localhost:8080/api", "search", "Luke"]);
        assert_eq!(args.catalog_url.as_deref(), Some("http://localhost:8080/api"));
        assert!(matches!(args.command, Some(Commands::Search(_))));
    }

    #[test]
    fn invalid_catalog_url_fails_client_init() {
        let config = Config {
            catalog_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(init_catalog_client(&config).is_err());
    }
}
