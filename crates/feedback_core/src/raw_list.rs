use std::collections::HashSet;

use crate::item::ListingId;

/// Parses the user's free-text pending list into unique ids, first occurrence wins.
pub fn parse_raw_ids(raw: &str) -> Vec<ListingId> {
    let mut seen = HashSet::new();
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
        .filter(|token| seen.insert(*token))
        .map(ToOwned::to_owned)
        .collect()
}

/// Canonical single-line form of the pending list.
pub fn sanitize_ids(ids: &[ListingId]) -> String {
    ids.join(" ")
}

/// Appends picked ids to the raw text on a new line.
pub fn append_ids(raw: &str, ids: &[ListingId]) -> String {
    let addition = sanitize_ids(ids);
    if raw.trim().is_empty() {
        addition
    } else if addition.is_empty() {
        raw.to_string()
    } else {
        format!("{}\n{}", raw.trim_end(), addition)
    }
}
