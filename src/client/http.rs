//! Blocking HTTP client for the Helios REST API.

use std::io::{self, Cursor, Read};
use std::time::Duration;

use serde::Deserialize;
use ureq::{Agent, AgentBuilder};

use super::{ClientFactory, NewSong, ServerStatus, StoredSong, UploadClient, UploadProgress};
use crate::error::UploadError;
use crate::utils::config::ClientConsts;

/// Where and how to reach the server.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub tls: bool,
    pub api_key: Option<String>,
    pub timeout_connect: Duration,
    pub timeout_read: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: ClientConsts::DEFAULT_HOST.to_string(),
            port: ClientConsts::DEFAULT_PORT,
            tls: true,
            api_key: None,
            timeout_connect: ClientConsts::TIMEOUT_CONNECT,
            timeout_read: ClientConsts::TIMEOUT_READ,
        }
    }
}

impl ClientConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Error body the server sends with 4xx/5xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// One connection pool to the server. Not shared between workers.
pub struct HeliosClient {
    agent: Agent,
    base_url: String,
    api_key: Option<String>,
}

impl HeliosClient {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(config.timeout_connect)
            .timeout_read(config.timeout_read)
            .build();
        Self {
            agent,
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let request = self
            .agent
            .request(method, &format!("{}{}", self.base_url, path))
            .set("User-Agent", ClientConsts::USER_AGENT)
            .set("Accept", "application/json");
        match &self.api_key {
            Some(key) => request.set("X-API-Key", key),
            None => request,
        }
    }

    /// Query server status (core count, song count). Also serves as a reachability check.
    pub fn server_status(&self) -> Result<ServerStatus, UploadError> {
        self.request("GET", "/status")
            .call()
            .map_err(classify_ureq_failure)?
            .into_json()
            .map_err(|e| UploadError::Other(format!("decode status response: {e}")))
    }
}

impl UploadClient for HeliosClient {
    fn get_song(&self, reference: &str) -> Result<StoredSong, UploadError> {
        self.request("GET", &song_path(reference))
            .call()
            .map_err(classify_ureq_failure)?
            .into_json()
            .map_err(|e| UploadError::Other(format!("decode song response: {e}")))
    }

    fn upload(
        &self,
        song: &NewSong,
        store: bool,
        progress: &mut dyn FnMut(UploadProgress),
    ) -> Result<StoredSong, UploadError> {
        let body = serde_json::to_vec(song)
            .map_err(|e| UploadError::Validation(format!("encode upload payload: {e}")))?;
        let total = body.len() as u64;
        let reader = ProgressReader {
            inner: Cursor::new(body),
            read: 0,
            total,
            progress,
        };
        self.request("POST", "/songs")
            .query("store", if store { "true" } else { "false" })
            .set("Content-Type", "application/json")
            .set("Content-Length", &total.to_string())
            .send(reader)
            .map_err(classify_ureq_failure)?
            .into_json()
            .map_err(|e| UploadError::Other(format!("decode upload response: {e}")))
    }
}

/// Builds a fresh [`HeliosClient`] (own agent, own connections) for each worker.
#[derive(Clone, Debug)]
pub struct HttpClientFactory {
    config: ClientConfig,
}

impl HttpClientFactory {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    type Client = HeliosClient;

    fn client(&self, worker: usize) -> HeliosClient {
        log::debug!("thread {}: connecting to {}", worker, self.config.base_url());
        HeliosClient::new(&self.config)
    }
}

/// Request body reader that reports each chunk handed to the transport.
struct ProgressReader<'a, R> {
    inner: R,
    read: u64,
    total: u64,
    progress: &'a mut dyn FnMut(UploadProgress),
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.read += n as u64;
            (self.progress)(UploadProgress {
                bytes_read: self.read,
                bytes_new: n as u64,
                bytes_total: self.total,
            });
        }
        Ok(n)
    }
}

/// Map a ureq failure onto the upload taxonomy.
pub fn classify_ureq_failure(error: ureq::Error) -> UploadError {
    match error {
        ureq::Error::Status(code, response) => {
            let detail = response_detail(response);
            match code {
                404 => UploadError::NotFound(detail),
                400 | 422 => UploadError::BadRequest(detail),
                _ => UploadError::Other(format!("HTTP {code}: {detail}")),
            }
        }
        ureq::Error::Transport(transport) => UploadError::Connection(transport.to_string()),
    }
}

fn response_detail(response: ureq::Response) -> String {
    let status_text = response.status_text().to_string();
    match response.into_string() {
        Ok(body) if !body.trim().is_empty() => serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.details.or(b.summary))
            .unwrap_or(body),
        _ => status_text,
    }
}

/// Lookup path for a catalogue reference; the reference is percent-encoded as one segment.
pub fn song_path(reference: &str) -> String {
    format!("/songs/by_reference/{}", urlencoding::encode(reference))
}
