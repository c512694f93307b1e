//! Source table retrieval boundary.
//!
//! # Responsibility
//! - Define how the pipeline asks for the raw lines of one year.
//! - Ship a directory-backed fetcher for pre-downloaded yearly files and an
//!   in-memory fetcher for embedding and tests.
//!
//! # Invariants
//! - A fetch yields the whole year or an error; there is no partial result.
//! - Yearly files are read as UTF-8 when valid, otherwise as Big5, the
//!   encoding the observatory publishes them in.
//! - Transport and retries stay outside this crate.

pub mod line_decoder;

use crate::config::SUPPORTED_YEARS;
use encoding_rs::BIG5;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub use line_decoder::{decode_line, decode_lines, SourceLine};

/// Upstream location of the yearly table, `{year}` substituted.
pub const SOURCE_URL_PATTERN: &str =
    "http://gb.weather.gov.hk/gts/time/calendar/text/T{year}c.txt";

pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug)]
pub enum SourceError {
    UnsupportedYear(i32),
    Missing {
        year: i32,
    },
    Io {
        year: i32,
        path: PathBuf,
        source: std::io::Error,
    },
    Encoding {
        year: i32,
        path: PathBuf,
    },
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedYear(year) => write!(
                f,
                "year {year} is outside the source table ({}..={})",
                SUPPORTED_YEARS.start(),
                SUPPORTED_YEARS.end()
            ),
            Self::Missing { year } => write!(f, "no source text available for year {year}"),
            Self::Io { year, path, source } => write!(
                f,
                "failed to read source text for year {year} from `{}`: {source}",
                path.display()
            ),
            Self::Encoding { year, path } => write!(
                f,
                "source text for year {year} in `{}` is neither UTF-8 nor Big5",
                path.display()
            ),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::UnsupportedYear(_) | Self::Missing { .. } | Self::Encoding { .. } => None,
        }
    }
}

/// Yields the decoded text lines of the source table for one year.
pub trait SourceFetcher {
    fn fetch_lines(&self, year: i32) -> SourceResult<Vec<String>>;
}

/// Upstream URL for `year`.
pub fn source_url(year: i32) -> String {
    SOURCE_URL_PATTERN.replace("{year}", &year.to_string())
}

/// File name used upstream and by [`DirectorySource`] for `year`.
pub fn source_file_name(year: i32) -> String {
    format!("T{year}c.txt")
}

fn ensure_supported(year: i32) -> SourceResult<()> {
    if SUPPORTED_YEARS.contains(&year) {
        Ok(())
    } else {
        Err(SourceError::UnsupportedYear(year))
    }
}

/// Decodes a yearly file: UTF-8 when the bytes are valid UTF-8, Big5
/// otherwise. `None` when neither fits.
pub fn decode_source_bytes(bytes: &[u8]) -> Option<Cow<'_, str>> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(Cow::Borrowed(text)),
        Err(_) => BIG5.decode_without_bom_handling_and_without_replacement(bytes),
    }
}

/// Reads `T{year}c.txt` files, Big5 as published or UTF-8, from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, year: i32) -> PathBuf {
        self.dir.join(source_file_name(year))
    }
}

impl SourceFetcher for DirectorySource {
    fn fetch_lines(&self, year: i32) -> SourceResult<Vec<String>> {
        ensure_supported(year)?;
        let path = self.path_for(year);
        let bytes = std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SourceError::Missing { year }
            } else {
                SourceError::Io {
                    year,
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let text = decode_source_bytes(&bytes).ok_or(SourceError::Encoding { year, path })?;
        Ok(text.lines().map(str::to_string).collect())
    }
}

/// Holds source text per year in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    years: BTreeMap<i32, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the full text for `year`, replacing any earlier text.
    pub fn insert(&mut self, year: i32, text: impl Into<String>) -> &mut Self {
        self.years.insert(year, text.into());
        self
    }
}

impl SourceFetcher for MemorySource {
    fn fetch_lines(&self, year: i32) -> SourceResult<Vec<String>> {
        ensure_supported(year)?;
        self.years
            .get(&year)
            .map(|text| text.lines().map(str::to_string).collect())
            .ok_or(SourceError::Missing { year })
    }
}
