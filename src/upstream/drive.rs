//! Google Drive v3 client for folder listings.
//!
//! The menu images live in two Drive folders, one per menu. A listing is a
//! single `files` query scoped to the folder, asking only for the fields the
//! frontend renders. Responses are passed through byte-for-byte; this client
//! never rewrites what Drive returns.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::menu::MenuKind;

use super::{Listing, Upstream, UpstreamError};

/// Production Drive endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// The fields the frontend needs to render a menu image grid.
const LISTING_FIELDS: &str = "files(id,name,mimeType,thumbnailLink,webContentLink)";

/// One page is plenty; the folders hold a handful of images.
const PAGE_SIZE: &str = "1000";

/// Everything a [`DriveClient`] needs to reach the API.
#[derive(Debug, Clone)]
pub struct DriveSettings {
    /// API key authorizing the `files.list` calls.
    pub api_key: String,
    /// Folder holding the lunch menu images.
    pub lunch_folder: String,
    /// Folder holding the dinner menu images.
    pub dinner_folder: String,
    /// Sent as the `Referer` header; the API key is referrer-restricted.
    pub referer: String,
    /// Per-request deadline covering connect, send, and body read.
    pub timeout: Duration,
}

/// HTTP client for the Drive v3 `files` endpoint.
pub struct DriveClient {
    client: reqwest::Client,
    base_url: String,
    settings: DriveSettings,
}

impl DriveClient {
    /// Builds a client with a dedicated connection pool and the configured
    /// request timeout.
    pub fn new(settings: DriveSettings) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_owned(),
            settings,
        })
    }

    /// Points the client at a different API root. Tests use this to target
    /// a local mock server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn folder_for(&self, kind: MenuKind) -> &str {
        match kind {
            MenuKind::Lunch => &self.settings.lunch_folder,
            MenuKind::Dinner => &self.settings.dinner_folder,
        }
    }
}

#[async_trait]
impl Upstream for DriveClient {
    async fn fetch(&self, kind: MenuKind) -> Result<Listing, UpstreamError> {
        let folder = self.folder_for(kind);
        debug!(menu = %kind, folder = %folder, "requesting folder listing");

        let response = self
            .client
            .get(format!("{}/files", self.base_url))
            .query(&[
                ("q", format!("'{folder}' in parents").as_str()),
                ("key", self.settings.api_key.as_str()),
                ("fields", LISTING_FIELDS),
                ("pageSize", PAGE_SIZE),
            ])
            .header("Referer", &self.settings.referer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(Listing::from_json_body(body)?)
    }
}
