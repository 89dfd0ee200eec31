//! Catalog interaction types.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

/// A 1-based page index as understood by the catalog's `?page=` parameter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct PageNumber(NonZeroU32);

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(NonZeroU32::MIN);

    /// Returns `None` for page `0`.
    pub fn new(page: u32) -> Option<Self> {
        NonZeroU32::new(page).map(PageNumber)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// The page before this one, if any.
    pub fn previous(self) -> Option<Self> {
        PageNumber::new(self.get() - 1)
    }

    /// The page after this one, saturating at `u32::MAX`.
    pub fn next(self) -> Self {
        PageNumber(self.0.saturating_add(1))
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        PageNumber::FIRST
    }
}


/// One page of results as returned by the catalog.
///
/// `count` is the total number of records across all pages, not the length
/// of `results`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageEnvelope {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<Person>,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A person record.
///
/// The controller only relies on `url` for identity; everything else is
/// carried through to the presentation layer unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub birth_year: String,
    #[serde(default)]
    pub eye_color: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub hair_color: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    pub mass: String,
    #[serde(default)]
    pub skin_color: String,
    #[serde(default)]
    pub homeworld: String,
    #[serde(default)]
    pub films: Vec<String>,
    #[serde(default)]
    pub species: Vec<String>,
    #[serde(default)]
    pub starships: Vec<String>,
    #[serde(default)]
    pub vehicles: Vec<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub edited: Option<DateTime<Utc>>,
}

impl Person {
    /// The record's id.
    ///
    /// The catalog usually omits `id`, in which case it is the last path
    /// segment of the record url (`.../people/1/` is `1`).
    pub fn id(&self) -> Option<&str> {
        if let Some(id) = &self.id {
            return Some(id);
        }
        self.url.rsplit('/').find(|segment| !segment.is_empty())
    }
}
