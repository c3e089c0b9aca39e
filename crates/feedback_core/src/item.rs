use std::fmt;

/// Opaque marketplace listing identifier.
pub type ListingId = String;

/// Feedback state of one listing under management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ItemStatus {
    #[default]
    Empty,
    Ignore,
    Done,
    Error,
}

impl ItemStatus {
    /// `Done` and `Ignore` items are inert to bulk feedback until reset.
    pub fn is_settled(self) -> bool {
        matches!(self, ItemStatus::Done | ItemStatus::Ignore)
    }

    /// Status only ever moves out of `Empty`; going back requires an explicit reset.
    pub fn accepts(self, next: ItemStatus) -> bool {
        self == ItemStatus::Empty && next != ItemStatus::Empty
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemStatus::Empty => "",
            ItemStatus::Ignore => "Ignore",
            ItemStatus::Done => "Done",
            ItemStatus::Error => "Error",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Handle into the thumbnail cache owned by a [`crate::WorkItemStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageHandle(pub(crate) u64);

impl ImageHandle {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Listing metadata as returned by a listing source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingMetadata {
    pub id: ListingId,
    pub title: String,
    /// Seconds since the Unix epoch; used for recency ordering.
    pub timestamp: i64,
    pub details: String,
}

impl ListingMetadata {
    pub fn new(id: impl Into<ListingId>, title: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            timestamp,
            details: String::new(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Lower-cased title, id and details, as matched by search.
    pub fn searchable_text(&self) -> String {
        searchable_text(&self.id, &self.title, &self.details)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingItem {
    pub id: ListingId,
    pub status: ItemStatus,
    pub title: String,
    pub timestamp: i64,
    pub thumbnail: Option<ImageHandle>,
    /// Lower-cased text the search filter matches against.
    pub searchable_text: String,
    /// Reason retained from the last failed feedback submission.
    pub last_error: Option<String>,
}

impl ListingItem {
    pub fn new(id: impl Into<ListingId>, title: impl Into<String>, timestamp: i64) -> Self {
        let id = id.into();
        let title = title.into();
        let searchable_text = searchable_text(&id, &title, "");
        Self {
            id,
            status: ItemStatus::Empty,
            title,
            timestamp,
            thumbnail: None,
            searchable_text,
            last_error: None,
        }
    }

    /// A queue entry typed in by the user: only the id is known.
    pub fn pending(id: impl Into<ListingId>) -> Self {
        let id = id.into();
        let title = id.clone();
        Self::new(id, title, 0)
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn from_metadata(metadata: &ListingMetadata) -> Self {
        let mut item = Self::new(metadata.id.clone(), metadata.title.clone(), metadata.timestamp);
        item.searchable_text = metadata.searchable_text();
        item
    }
}

fn searchable_text(id: &str, title: &str, details: &str) -> String {
    let mut text = String::with_capacity(id.len() + title.len() + details.len() + 2);
    text.push_str(title);
    text.push(' ');
    text.push_str(id);
    if !details.is_empty() {
        text.push(' ');
        text.push_str(details);
    }
    text.to_lowercase()
}

/// Status change applied to one or more items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackUpdate {
    pub status: ItemStatus,
}

impl FeedbackUpdate {
    pub fn new(status: ItemStatus) -> Self {
        Self { status }
    }

    pub fn ignore() -> Self {
        Self::new(ItemStatus::Ignore)
    }

    pub fn done() -> Self {
        Self::new(ItemStatus::Done)
    }
}
