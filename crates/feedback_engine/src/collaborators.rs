//! Remote collaborators consumed by the background tasks.

use std::sync::Arc;

use bytes::Bytes;
use feedback_core::{FeedbackUpdate, ListingMetadata};

use crate::types::RemoteError;

/// Parameters of one browse request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchState {
    pub query: String,
}

#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_browsable_listings(
        &self,
        search: &SearchState,
    ) -> Result<Vec<ListingMetadata>, RemoteError>;
}

#[async_trait::async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_thumbnail(&self, listing_id: &str) -> Result<Bytes, RemoteError>;
}

#[async_trait::async_trait]
pub trait FeedbackSubmitter: Send + Sync {
    async fn submit_feedback(
        &self,
        listing_id: &str,
        update: FeedbackUpdate,
    ) -> Result<(), RemoteError>;
}

#[derive(Clone)]
pub struct Collaborators {
    pub listings: Arc<dyn ListingSource>,
    pub images: Arc<dyn ImageSource>,
    pub feedback: Arc<dyn FeedbackSubmitter>,
}
