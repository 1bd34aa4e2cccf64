//! In-memory upload service shared by the pipeline tests.
#![allow(dead_code)]

use helios_import::client::{ClientFactory, NewSong, StoredSong, UploadClient, UploadProgress};
use helios_import::error::{CatalogueError, UploadError};
use helios_import::{CatalogueRecord, ImportSettings};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the fake server answers uploads.
#[derive(Clone, Debug)]
pub enum FailMode {
    Never,
    /// Every upload fails with a connection error.
    Always,
    /// Uploads of these references fail with a bad request.
    References(HashSet<String>),
    /// The existence check itself fails with a connection error.
    Lookups,
}

#[derive(Debug)]
pub struct MockServer {
    pub known: Mutex<HashSet<String>>,
    pub uploaded: Mutex<Vec<String>>,
    /// `store` flag of every upload attempt, in call order.
    pub store_flags: Mutex<Vec<bool>>,
    pub uploads: AtomicUsize,
    pub lookups: AtomicUsize,
    pub fail: FailMode,
    pub delay: Duration,
}

impl MockServer {
    pub fn new(fail: FailMode) -> Arc<Self> {
        Self::with_delay(fail, Duration::ZERO)
    }

    pub fn with_delay(fail: FailMode, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            known: Mutex::new(HashSet::new()),
            uploaded: Mutex::new(Vec::new()),
            store_flags: Mutex::new(Vec::new()),
            uploads: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
            fail,
            delay,
        })
    }

    pub fn preload<'a>(&self, references: impl IntoIterator<Item = &'a str>) {
        let mut known = self.known.lock().unwrap();
        known.extend(references.into_iter().map(str::to_string));
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn store_flags(&self) -> Vec<bool> {
        self.store_flags.lock().unwrap().clone()
    }
}

pub struct MockClient(Arc<MockServer>);

impl UploadClient for MockClient {
    fn get_song(&self, reference: &str) -> Result<StoredSong, UploadError> {
        self.0.lookups.fetch_add(1, Ordering::SeqCst);
        if matches!(self.0.fail, FailMode::Lookups) {
            return Err(UploadError::Connection("connection reset".to_string()));
        }
        if self.0.known.lock().unwrap().contains(reference) {
            Ok(StoredSong {
                reference: reference.to_string(),
                ..StoredSong::default()
            })
        } else {
            Err(UploadError::NotFound(reference.to_string()))
        }
    }

    fn upload(
        &self,
        song: &NewSong,
        store: bool,
        progress: &mut dyn FnMut(UploadProgress),
    ) -> Result<StoredSong, UploadError> {
        self.0.uploads.fetch_add(1, Ordering::SeqCst);
        self.0.store_flags.lock().unwrap().push(store);
        if !self.0.delay.is_zero() {
            std::thread::sleep(self.0.delay);
        }
        match &self.0.fail {
            FailMode::Always => {
                return Err(UploadError::Connection("connection refused".to_string()));
            }
            FailMode::References(refs) if refs.contains(&song.reference) => {
                return Err(UploadError::BadRequest("rejected".to_string()));
            }
            _ => {}
        }
        let total = song.file.len() as u64;
        progress(UploadProgress {
            bytes_read: total,
            bytes_new: total,
            bytes_total: total,
        });
        self.0.known.lock().unwrap().insert(song.reference.clone());
        self.0.uploaded.lock().unwrap().push(song.reference.clone());
        Ok(StoredSong {
            reference: song.reference.clone(),
            ..StoredSong::default()
        })
    }
}

pub struct MockFactory(pub Arc<MockServer>);

impl ClientFactory for MockFactory {
    type Client = MockClient;

    fn client(&self, _worker: usize) -> MockClient {
        MockClient(Arc::clone(&self.0))
    }
}

/// Records `song-1..=song-n`, each pointing at a small media file in `dir`.
pub fn media_records(dir: &Path, n: usize) -> Vec<CatalogueRecord> {
    (1..=n)
        .map(|i| {
            let path = dir.join(format!("song-{i}.mp3"));
            std::fs::write(&path, format!("fake audio {i}")).unwrap();
            CatalogueRecord {
                reference: format!("song-{i}"),
                path,
                ..CatalogueRecord::default()
            }
        })
        .collect()
}

pub fn as_rows(
    records: Vec<CatalogueRecord>,
) -> impl Iterator<Item = Result<CatalogueRecord, CatalogueError>> {
    records.into_iter().map(Ok)
}

/// Short poll interval so stop and drain are observed quickly.
pub fn settings(workers: usize, max_errors: u32) -> ImportSettings {
    ImportSettings {
        workers,
        max_errors,
        poll_interval: Duration::from_millis(20),
        ..ImportSettings::default()
    }
}
