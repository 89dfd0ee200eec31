//! Search and pagination logic for browsing the people catalog.
//!
//! The [`controller`] owns all state of a browsing session and reacts to
//! query and page intents. The building blocks it wires together live in
//! [`models`] (search term validation, pagination) and [`utils`]
//! (debounced scheduling).

pub mod controller;
pub mod models;
pub mod utils;
