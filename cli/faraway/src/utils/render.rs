//! Plain text rendering of people and controller snapshots.

use std::io::Write;
use std::num::NonZeroU64;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use faraway_catalog::{PageEnvelope, PageNumber, Person};
use faraway_sdk::controller::Snapshot;
use faraway_sdk::models::pagination::PaginationView;
use indoc::formatdoc;

pub const NOT_FOUND: &str = "Person not found...";
pub const LOADING: &str = "Loading...";

fn or_unknown(value: &str) -> &str {
    if value.is_empty() { "unknown" } else { value }
}

pub fn person_card(person: &Person) -> String {
    formatdoc! {"
        {name}
          gender:     {gender}
          birth year: {birth_year}",
        name = person.name,
        gender = or_unknown(&person.gender),
        birth_year = or_unknown(&person.birth_year),
    }
}

/// Cards separated by blank lines, or [NOT_FOUND] for an empty list.
pub fn records(records: &[Person]) -> String {
    if records.is_empty() {
        return NOT_FOUND.to_string();
    }
    records
        .iter()
        .map(person_card)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Navigation controls, `None` if there is nothing to navigate.
///
/// Controls that are unavailable are left out.
pub fn pagination_line(view: &PaginationView, current_page: PageNumber) -> Option<String> {
    if !view.is_visible() {
        return None;
    }

    let mut parts = Vec::new();
    if view.has_previous {
        parts.push("« :prev".to_string());
    }
    if u64::from(current_page.get()) <= view.page_count {
        parts.push(format!("page {current_page} of {}", view.page_count));
    } else {
        parts.push(format!("{} pages", view.page_count));
    }
    if view.has_next {
        parts.push(":next »".to_string());
    }
    Some(parts.join(" | "))
}

/// A single page fetched outside of a controller.
pub fn envelope(
    envelope: &PageEnvelope,
    current_page: PageNumber,
    page_size: NonZeroU64,
) -> String {
    let view = PaginationView::derive(Some(envelope), page_size);

    let mut sections = vec![records(&envelope.results)];
    sections.extend(pagination_line(&view, current_page));
    sections.join("\n\n")
}

pub fn snapshot(snapshot: &Snapshot) -> String {
    let mut sections = Vec::new();
    if !snapshot.query_text.is_empty() {
        sections.push(format!("search: {}", snapshot.query_text));
    }
    if snapshot.is_loading {
        sections.push(LOADING.to_string());
    }
    // Nothing arrived yet, an empty list here doesn't mean "not found".
    if !(snapshot.is_loading && snapshot.records.is_empty()) {
        sections.push(records(&snapshot.records));
    }
    sections.extend(pagination_line(&snapshot.pagination, snapshot.current_page));
    sections.join("\n\n")
}

/// Write `snapshot` to `out`, replacing the previous screen if `clear` is set.
pub fn draw(out: &mut impl Write, snapshot: &Snapshot, clear: bool) -> std::io::Result<()> {
    if clear {
        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    }
    writeln!(out, "{}", self::snapshot(snapshot))?;
    out.flush()
}
