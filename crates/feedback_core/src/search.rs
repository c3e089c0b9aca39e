//! Free-text filtering over a remote listing snapshot.

use crate::item::ListingMetadata;

/// Lower-cased, trimmed query text.
///
/// An item matches when the whole query is a substring of its searchable text
/// (title, id and details). A blank query matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn parse(query: &str) -> Self {
        Self {
            needle: query.trim().to_lowercase(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches(&self, listing: &ListingMetadata) -> bool {
        self.needle.is_empty() || listing.searchable_text().contains(&self.needle)
    }
}

/// Keeps the listings matching `query`, in source order. Display ordering is
/// the store's job.
pub fn filter_listings(query: &str, listings: &[ListingMetadata]) -> Vec<ListingMetadata> {
    let query = SearchQuery::parse(query);
    listings
        .iter()
        .filter(|listing| query.matches(listing))
        .cloned()
        .collect()
}
