use std::sync::LazyLock;

use regex::Regex;

/// Longest search term the catalog is queried with.
pub const MAX_SEARCH_TERM_LEN: usize = 240;

/// ASCII letters, digits, space and a fixed set of punctuation.
///
/// `{1,240}` counts characters, every accepted character is a single byte.
static SEARCH_TERM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[A-Za-z0-9 !@#$%^&*()_+\-=\[\]{};':"\\|,.<>/?]{1,240}$"#)
        .expect("search term pattern is valid")
});

/// Whether `text` may be sent to the catalog as a search term.
pub fn is_valid_search_term(text: &str) -> bool {
    SEARCH_TERM_PATTERN.is_match(text)
}

/// What the query text asks the controller to do once it settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIntent {
    /// The query is empty: browse by page.
    Browse,
    /// Search the whole catalog for this term.
    Search(String),
    /// The term can't be sent, nothing happens.
    Rejected,
}

impl QueryIntent {
    pub fn from_query(text: &str) -> Self {
        if text.is_empty() {
            QueryIntent::Browse
        } else if is_valid_search_term(text) {
            QueryIntent::Search(text.to_string())
        } else {
            QueryIntent::Rejected
        }
    }
}
