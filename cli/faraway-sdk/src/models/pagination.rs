use std::num::NonZeroU64;

use faraway_catalog::PageEnvelope;
use serde::Serialize;

/// Navigation metadata derived from the last received page.
///
/// A `page_count` of `0` means there is nothing to paginate and no controls
/// should be shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaginationView {
    pub page_count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationView {
    /// Derive the view from an envelope and the catalog's page size.
    pub fn derive(envelope: Option<&PageEnvelope>, page_size: NonZeroU64) -> Self {
        let Some(envelope) = envelope else {
            return Self::default();
        };

        Self {
            page_count: envelope.count.div_ceil(page_size.get()),
            has_next: envelope.next.is_some(),
            has_previous: envelope.previous.is_some(),
        }
    }

    /// Whether pagination controls should be shown at all.
    pub fn is_visible(&self) -> bool {
        self.page_count > 0
    }
}
