use feedback_core::SortOrder;

use crate::fetch::FetchSettings;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub listing_endpoint: String,
    pub feedback_endpoint: String,
    /// Thumbnail URL with an `{id}` placeholder.
    pub thumbnail_url_template: String,
    pub fetch: FetchSettings,
    pub picklist_sort: SortOrder,
    pub worker_threads: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            listing_endpoint: "http://127.0.0.1:8080/listings".to_string(),
            feedback_endpoint: "http://127.0.0.1:8080/feedback".to_string(),
            thumbnail_url_template: "http://127.0.0.1:8080/thumbnails/{id}".to_string(),
            fetch: FetchSettings::default(),
            picklist_sort: SortOrder::TimestampDesc,
            worker_threads: 2,
        }
    }
}
