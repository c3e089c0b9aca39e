//! Marketplace-neutral HTTP listing source and feedback submitter.
//!
//! Listings: `GET {endpoint}?q=<query>` answering a JSON array of
//! `{"id", "title", "timestamp", "details"?}`.
//! Feedback: `POST {endpoint}/<id>` with `{"status": "Done"}`.

use feedback_core::{FeedbackUpdate, ListingMetadata};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::collaborators::{FeedbackSubmitter, ListingSource, SearchState};
use crate::fetch::{build_client, map_reqwest_error, FetchSettings};
use crate::types::{RemoteError, RemoteErrorKind};

#[derive(Debug, Deserialize)]
struct WireListing {
    id: String,
    title: String,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    details: String,
}

#[derive(Debug, Serialize)]
struct WireFeedback<'a> {
    status: &'a str,
}

fn parse_endpoint(endpoint: &str) -> Result<reqwest::Url, RemoteError> {
    reqwest::Url::parse(endpoint)
        .map_err(|err| RemoteError::new(RemoteErrorKind::InvalidUrl, err.to_string()))
}

fn check_status(response: &reqwest::Response) -> Result<(), RemoteError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(RemoteError::new(
            RemoteErrorKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct HttpListingSource {
    endpoint: reqwest::Url,
    client: reqwest::Client,
}

impl HttpListingSource {
    pub fn new(endpoint: &str, settings: &FetchSettings) -> Result<Self, RemoteError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            client: build_client(settings)?,
        })
    }
}

#[async_trait::async_trait]
impl ListingSource for HttpListingSource {
    async fn fetch_browsable_listings(
        &self,
        search: &SearchState,
    ) -> Result<Vec<ListingMetadata>, RemoteError> {
        let mut url = self.endpoint.clone();
        if !search.query.trim().is_empty() {
            url.query_pairs_mut().append_pair("q", search.query.trim());
        }
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        check_status(&response)?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let listings: Vec<WireListing> = serde_json::from_slice(&body)
            .map_err(|err| RemoteError::new(RemoteErrorKind::Decode, err.to_string()))?;
        Ok(listings
            .into_iter()
            .map(|wire| {
                ListingMetadata::new(wire.id, wire.title, wire.timestamp).with_details(wire.details)
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct HttpFeedbackSubmitter {
    endpoint: reqwest::Url,
    client: reqwest::Client,
}

impl HttpFeedbackSubmitter {
    pub fn new(endpoint: &str, settings: &FetchSettings) -> Result<Self, RemoteError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            client: build_client(settings)?,
        })
    }

    fn item_url(&self, listing_id: &str) -> Result<reqwest::Url, RemoteError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::new(RemoteErrorKind::InvalidUrl, "endpoint cannot be a base"))?
            .pop_if_empty()
            .push(listing_id);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl FeedbackSubmitter for HttpFeedbackSubmitter {
    async fn submit_feedback(
        &self,
        listing_id: &str,
        update: FeedbackUpdate,
    ) -> Result<(), RemoteError> {
        let url = self.item_url(listing_id)?;
        let body = serde_json::to_vec(&WireFeedback {
            status: update.status.label(),
        })
        .map_err(|err| RemoteError::new(RemoteErrorKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(RemoteError::new(
                RemoteErrorKind::Rejected,
                "feedback already left for this listing",
            ));
        }
        check_status(&response)
    }
}
