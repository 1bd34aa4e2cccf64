//! Upload client seam: what the pipeline needs from the remote service.
//!
//! Workers each own one client, built from a shared [`ClientFactory`]. The HTTP implementation
//! lives in [`http`]; tests plug in an in-memory one.

pub mod http;

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

pub use http::{ClientConfig, HeliosClient, HttpClientFactory, classify_ureq_failure, song_path};

/// Upload progress as reported during a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes sent so far.
    pub bytes_read: u64,
    /// Bytes sent since the previous report.
    pub bytes_new: u64,
    pub bytes_total: u64,
}

impl UploadProgress {
    pub fn is_complete(&self) -> bool {
        self.bytes_read == self.bytes_total
    }
}

/// Upload payload for a new song. `None` fields are left for the server to detect.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NewSong {
    pub reference: String,
    /// Base64-encoded media file.
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beats_per_minute: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Song as stored on the server. Only the fields the importer logs are modelled.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StoredSong {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CpuStatus {
    #[serde(default)]
    pub cores: usize,
}

/// Server status; used to size the worker pool and to check reachability.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub cpu: CpuStatus,
    #[serde(default)]
    pub songs: u64,
    #[serde(default)]
    pub version: Option<String>,
}

/// Operations the pipeline calls on the remote service.
pub trait UploadClient {
    /// Look up a song by catalogue reference. Fails with [`UploadError::NotFound`] when unknown.
    fn get_song(&self, reference: &str) -> Result<StoredSong, UploadError>;

    /// Upload a new song. `progress` is called as the body is sent.
    fn upload(
        &self,
        song: &NewSong,
        store: bool,
        progress: &mut dyn FnMut(UploadProgress),
    ) -> Result<StoredSong, UploadError>;

    /// True when the server already has `reference`. `NotFound` is not an error here.
    fn exists(&self, reference: &str) -> Result<bool, UploadError> {
        match self.get_song(reference) {
            Ok(_) => Ok(true),
            Err(UploadError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Builds one client per worker. Shared across worker threads.
pub trait ClientFactory: Send + Sync + 'static {
    type Client: UploadClient;

    fn client(&self, worker: usize) -> Self::Client;
}
