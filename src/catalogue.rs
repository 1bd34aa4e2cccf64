//! CSV catalogue source: header-less rows of
//! `reference, album, artist, title, genre, isrc, year, path[, beats_per_minute]`.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::CatalogueRecord;
use crate::error::CatalogueError;

/// Column positions in a catalogue row.
struct Columns;

impl Columns {
    const REFERENCE: usize = 0;
    const ALBUM: usize = 1;
    const ARTIST: usize = 2;
    const TITLE: usize = 3;
    const GENRE: usize = 4;
    const ISRC: usize = 5;
    const YEAR: usize = 6;
    const PATH: usize = 7;
    const BEATS_PER_MINUTE: usize = 8;
}

/// Lazy, ordered reader over a catalogue. Yields one `Result` per non-blank row.
///
/// A row error (missing required field) is yielded and reading goes on; a syntax or I/O error
/// ends the iteration.
pub struct CatalogueReader<R: Read> {
    inner: csv::Reader<R>,
    row: StringRecord,
    failed: bool,
}

impl CatalogueReader<File> {
    /// Open a catalogue file.
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("open catalogue file {}", path.display()))?;
        Ok(Self::from_reader(file, delimiter))
    }
}

impl<R: Read> CatalogueReader<R> {
    pub fn from_reader(reader: R, delimiter: u8) -> Self {
        let inner = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .double_quote(false)
            .escape(Some(b'\\'))
            .flexible(true)
            .trim(Trim::Fields)
            .from_reader(reader);
        Self {
            inner,
            row: StringRecord::new(),
            failed: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<CatalogueRecord>, CatalogueError> {
        loop {
            if !self.inner.read_record(&mut self.row)? {
                return Ok(None);
            }
            // Whitespace-only lines trim down to empty fields.
            if self.row.iter().all(str::is_empty) {
                continue;
            }
            let line = self.row.position().map(|p| p.line()).unwrap_or(0);
            return parse_row(&self.row, line).map(Some);
        }
    }
}

impl<R: Read> Iterator for CatalogueReader<R> {
    type Item = Result<CatalogueRecord, CatalogueError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_record() {
            Ok(record) => record.map(Ok),
            Err(e) => {
                self.failed = !e.is_row_error();
                Some(Err(e))
            }
        }
    }
}

fn parse_row(row: &StringRecord, line: u64) -> Result<CatalogueRecord, CatalogueError> {
    let field = |i: usize| row.get(i).map(str::to_string);
    let required = |i: usize, name: &'static str| {
        row.get(i)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or(CatalogueError::MissingField { line, field: name })
    };

    Ok(CatalogueRecord {
        reference: required(Columns::REFERENCE, "reference")?,
        path: PathBuf::from(required(Columns::PATH, "path")?),
        album: field(Columns::ALBUM),
        artist: field(Columns::ARTIST),
        title: field(Columns::TITLE),
        genre: field(Columns::GENRE),
        isrc: field(Columns::ISRC),
        year: field(Columns::YEAR),
        beats_per_minute: field(Columns::BEATS_PER_MINUTE),
    })
}

/// Number of non-blank lines in the catalogue; the "of N" in progress messages.
pub fn count_records(path: &Path) -> Result<usize> {
    let file = File::open(path)
        .with_context(|| format!("open catalogue file {}", path.display()))?;
    let mut total = 0;
    for line in BufReader::new(file).lines() {
        if !line?.trim().is_empty() {
            total += 1;
        }
    }
    Ok(total)
}
