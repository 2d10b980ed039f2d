//! The origin side of the gateway: fetching menu listings.
//!
//! [`Upstream`] is the seam the gateway calls through; [`DriveClient`] is the
//! production implementation against the Google Drive v3 API. The listing
//! body is kept verbatim (clients receive exactly what the origin produced),
//! but it is probed once at fetch time so the gateway can tell a populated
//! listing from an empty one without reparsing.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use thiserror::Error;

use crate::menu::MenuKind;

pub mod drive;

pub use drive::{DriveClient, DriveSettings};

/// A successfully fetched menu listing.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Verbatim response body from the origin.
    pub body: Bytes,
    /// Number of entries in the listing's `files` array.
    pub file_count: usize,
}

impl Listing {
    /// Builds a listing from a raw JSON body, counting its `files` entries.
    ///
    /// A body without a `files` key is a valid, empty listing; a body that
    /// is not a JSON object is an error.
    pub fn from_json_body(body: Bytes) -> Result<Self, serde_json::Error> {
        let probe: ListingProbe = serde_json::from_slice(&body)?;
        Ok(Self {
            body,
            file_count: probe.files.len(),
        })
    }

    /// Returns `true` if the listing contains no files.
    ///
    /// Empty listings are served but never cached: an empty `files` array
    /// usually means the folder is mid-repopulation, and pinning it for the
    /// cache lifetime would hide the real menu once it lands.
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }
}

/// Counts `files` entries without building their values.
#[derive(Deserialize)]
struct ListingProbe {
    #[serde(default)]
    files: Vec<serde::de::IgnoredAny>,
}

/// Errors from fetching a listing.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The origin could not be reached, timed out, or the transfer failed.
    #[error("upstream transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The origin answered with a non-success status.
    #[error("upstream returned status {code}")]
    Status { code: u16 },

    /// The origin answered 2xx but the body is not a JSON listing.
    #[error("upstream body is not a valid listing: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Fetches the current listing for a menu.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, kind: MenuKind) -> Result<Listing, UpstreamError>;
}
