use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::collaborators::ImageSource;
use crate::types::{RemoteError, RemoteErrorKind};

pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 2 * 1024 * 1024,
            allowed_content_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
        }
    }
}

/// Shared client construction for all HTTP collaborators.
pub(crate) fn build_client(settings: &FetchSettings) -> Result<reqwest::Client, RemoteError> {
    reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
        .build()
        .map_err(|err| RemoteError::new(RemoteErrorKind::Network, err.to_string()))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::new(RemoteErrorKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return RemoteError::new(RemoteErrorKind::RedirectLimitExceeded, err.to_string());
    }
    RemoteError::new(RemoteErrorKind::Network, err.to_string())
}

/// Downloads thumbnails from a URL template such as
/// `https://img.example.com/thumbs/{id}.jpg`.
#[derive(Debug, Clone)]
pub struct ReqwestImageSource {
    url_template: String,
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestImageSource {
    pub fn new(url_template: impl Into<String>, settings: FetchSettings) -> Result<Self, RemoteError> {
        let client = build_client(&settings)?;
        Ok(Self {
            url_template: url_template.into(),
            settings,
            client,
        })
    }

    pub fn thumbnail_url(&self, listing_id: &str) -> Result<reqwest::Url, RemoteError> {
        let encoded: String = url::form_urlencoded::byte_serialize(listing_id.as_bytes()).collect();
        let raw = self.url_template.replace(ID_PLACEHOLDER, &encoded);
        reqwest::Url::parse(&raw).map_err(|err| RemoteError::new(RemoteErrorKind::InvalidUrl, err.to_string()))
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    fn too_large(&self, actual: u64) -> RemoteError {
        RemoteError::new(
            RemoteErrorKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "thumbnail too large",
        )
    }
}

#[async_trait::async_trait]
impl ImageSource for ReqwestImageSource {
    async fn fetch_thumbnail(&self, listing_id: &str) -> Result<Bytes, RemoteError> {
        let url = self.thumbnail_url(listing_id)?;
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::new(
                RemoteErrorKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(self.too_large(content_len));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        match content_type.as_deref() {
            Some(ct) if self.is_content_type_allowed(ct) => {}
            other => {
                let content_type = other.unwrap_or("<missing>").to_string();
                return Err(RemoteError::new(
                    RemoteErrorKind::UnsupportedContentType { content_type },
                    "not an image",
                ));
            }
        }

        let mut bytes = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(self.too_large(next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes.freeze())
    }
}
