//! Turns one year of source text into validated day records.
//!
//! # Invariants
//! - Non-data lines are skipped, never reported as errors.
//! - Every decoded label must be in the label dictionary, except on the
//!   known-bad dates that correction overwrites afterwards.

use crate::model::day_record::DayRecord;
use crate::model::lunar_label::LabelError;
use crate::service::correction::is_known_bad_date;
use crate::source::decode_lines;
use chrono::{Datelike, NaiveDate};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    UnknownLabel {
        year: i32,
        date: NaiveDate,
        source: LabelError,
    },
    NoRecords {
        year: i32,
    },
}

impl Display for IngestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLabel { year, date, source } => {
                write!(f, "ingestion of {year} failed at {date}: {source}")
            }
            Self::NoRecords { year } => {
                write!(f, "source text for {year} contains no data lines")
            }
        }
    }
}

impl Error for IngestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownLabel { source, .. } => Some(source),
            Self::NoRecords { .. } => None,
        }
    }
}

/// Summary of one ingested year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub year: i32,
    /// Lines received from the source, data or not.
    pub lines: usize,
    /// Data lines decoded into records.
    pub records: usize,
    /// Records outside `year`; kept, but logged.
    pub foreign_records: usize,
    /// Undecodable labels accepted because correction will fix them.
    pub pending_corrections: usize,
}

/// Decodes and validates the lines of `year`.
pub fn prepare_year<S: AsRef<str>>(
    year: i32,
    lines: &[S],
) -> Result<(Vec<DayRecord>, IngestReport), IngestError> {
    let records = decode_lines(lines);
    if records.is_empty() {
        return Err(IngestError::NoRecords { year });
    }

    let mut report = IngestReport {
        year,
        lines: lines.len(),
        records: records.len(),
        ..IngestReport::default()
    };

    for record in &records {
        if record.date.year() != year {
            report.foreign_records += 1;
        }
        if let Err(source) = record.lunar() {
            if !is_known_bad_date(record.date) {
                return Err(IngestError::UnknownLabel {
                    year,
                    date: record.date,
                    source,
                });
            }
            warn!(
                "event=ingest_year module=ingest status=pending_correction date={} label={}",
                record.date,
                source.label()
            );
            report.pending_corrections += 1;
        }
    }

    Ok((records, report))
}
