//! helios-import: batch import a song catalogue into a Helios music-analysis server

pub mod catalogue;
pub mod client;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use log::debug;

use crate::client::ClientFactory;
use crate::error::CatalogueError;
use crate::pipeline::BatchImporter;

/// Result alias used by public helios-import API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: import `records` with `settings`, uploading through clients built by
/// `factory`. Blocks until the run is over and returns its report.
///
/// Use [`BatchImporter`] directly when you need to stop the run from another thread.
///
/// ```ignore
/// let factory = helios_import::client::HttpClientFactory::new(config);
/// let reader = helios_import::catalogue::CatalogueReader::from_path(path, b',')?;
/// let report = helios_import::import_catalogue(&settings, factory, reader)?;
/// std::process::exit(if report.is_success() { 0 } else { 1 });
/// ```
pub fn import_catalogue<F, I>(
    settings: &ImportSettings,
    factory: F,
    records: I,
) -> Result<ImportReport>
where
    F: ClientFactory,
    I: IntoIterator<Item = std::result::Result<CatalogueRecord, CatalogueError>>,
{
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        settings
    );
    let importer = BatchImporter::new(settings.clone(), factory);
    importer.start(records)
}
