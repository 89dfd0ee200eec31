pub mod pagination;
pub mod search_term;
