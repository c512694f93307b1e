//! Pipeline orchestration over a day repository.
//!
//! # Responsibility
//! - Run ingestion, correction, holiday derivation and export against one
//!   [`DayRepository`].
//! - Log each stage with counts and durations.
//!
//! # Invariants
//! - Each incremental stage commits before the next one starts.
//! - Rebuild runs the stages in order (ingest every year, correct, derive)
//!   on staged records, then swaps them into the store in one transaction.
//!   A failed rebuild leaves the store as it was.
//! - Export never mutates the store.

use crate::config::{DateRange, SUPPORTED_YEARS};
use crate::model::day_record::DayRecord;
use crate::model::holiday::HolidayAssignment;
use crate::repo::day_repo::{DayRepository, RepoError};
use crate::service::correction::{known_corrections, LabelCorrection};
use crate::service::holiday_service::{derive_holidays, HolidayError};
use crate::service::ical::render_calendar;
use crate::service::ingest_service::{prepare_year, IngestError, IngestReport};
use crate::source::{SourceError, SourceFetcher};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

pub type CalendarResult<T> = Result<T, CalendarError>;

/// Pipeline error wrapping the failing stage.
#[derive(Debug)]
pub enum CalendarError {
    Source(SourceError),
    Ingest(IngestError),
    Holiday(HolidayError),
    Repo(RepoError),
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for CalendarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "{err}"),
            Self::Ingest(err) => write!(f, "{err}"),
            Self::Holiday(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Write { path, source } => {
                write!(f, "failed to write calendar `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for CalendarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Ingest(err) => Some(err),
            Self::Holiday(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Write { source, .. } => Some(source),
        }
    }
}

impl From<SourceError> for CalendarError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<IngestError> for CalendarError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<HolidayError> for CalendarError {
    fn from(value: HolidayError) -> Self {
        Self::Holiday(value)
    }
}

impl From<RepoError> for CalendarError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Totals of a full rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub years: usize,
    pub records: usize,
    pub corrections: usize,
    pub holidays: usize,
}

/// Use-case service for the lunar calendar pipeline.
pub struct CalendarService<R: DayRepository> {
    repo: R,
}

impl<R: DayRepository> CalendarService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Fetches, decodes and upserts one year of the source table.
    ///
    /// # Errors
    /// - Fetch failures and unknown labels fail the whole year; nothing from
    ///   that year is written.
    pub fn ingest_year<F: SourceFetcher>(
        &mut self,
        fetcher: &F,
        year: i32,
    ) -> CalendarResult<IngestReport> {
        let lines = fetch_year(fetcher, year)?;
        self.ingest_lines(year, &lines)
    }

    /// Decodes and upserts already-fetched lines for `year`.
    pub fn ingest_lines<S: AsRef<str>>(
        &mut self,
        year: i32,
        lines: &[S],
    ) -> CalendarResult<IngestReport> {
        let started_at = Instant::now();
        let (records, report) = stage_lines(year, lines)?;
        self.repo.upsert_days(&records)?;
        info!(
            "event=ingest_year module=service status=ok year={year} lines={} records={} duration_ms={}",
            report.lines,
            report.records,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Overwrites the labels of the known-bad dates; returns rows changed.
    pub fn apply_corrections(&mut self) -> CalendarResult<usize> {
        let corrections = known_corrections();
        let labels: Vec<(NaiveDate, &str)> = corrections
            .iter()
            .map(|correction| (correction.date, correction.lunar_label))
            .collect();
        let changed = self.repo.set_lunar_labels(&labels)?;
        log_corrections(corrections.len(), changed);
        Ok(changed)
    }

    /// Derives holidays over the whole store and writes them in one pass.
    pub fn update_holidays(&mut self) -> CalendarResult<usize> {
        let started_at = Instant::now();
        let records = self.repo.list_days(None)?;
        let assignments = derive_logged(&records)?;
        let written = self.repo.replace_holidays(&assignments)?;
        info!(
            "event=holiday_update module=service status=ok records={} assignments={} written={written} duration_ms={}",
            records.len(),
            assignments.len(),
            started_at.elapsed().as_millis()
        );
        Ok(written)
    }

    /// Rebuilds the store from 1901..=2100: ingest, correct, derive.
    ///
    /// Every year is fetched and validated before the store is touched, and
    /// the new contents replace the old ones in a single transaction.
    pub fn rebuild<F: SourceFetcher>(&mut self, fetcher: &F) -> CalendarResult<RebuildReport> {
        let started_at = Instant::now();
        info!("event=rebuild module=service status=start");

        let mut report = RebuildReport::default();
        let mut staged = BTreeMap::new();
        for year in SUPPORTED_YEARS {
            let lines = fetch_year(fetcher, year)?;
            let (records, ingested) = stage_lines(year, &lines)?;
            report.years += 1;
            report.records += ingested.records;
            staged.extend(records.into_iter().map(|record| (record.date, record)));
        }

        let corrections = known_corrections();
        report.corrections = correct_staged(&mut staged, &corrections);
        log_corrections(corrections.len(), report.corrections);

        let mut records: Vec<DayRecord> = staged.into_values().collect();
        let assignments = derive_logged(&records)?;
        report.holidays = assign_staged(&mut records, &assignments);

        let written = self.repo.replace_all_days(&records)?;
        info!(
            "event=rebuild module=service status=ok years={} records={} written={written} corrections={} holidays={} duration_ms={}",
            report.years,
            report.records,
            report.corrections,
            report.holidays,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Loads one day.
    pub fn day(&self, date: NaiveDate) -> CalendarResult<Option<DayRecord>> {
        Ok(self.repo.get_day(date)?)
    }

    /// Loads the days of `range` in date order.
    pub fn days(&self, range: &DateRange) -> CalendarResult<Vec<DayRecord>> {
        Ok(self.repo.list_days(Some(range))?)
    }

    /// Whether nothing has been ingested yet.
    pub fn is_empty(&self) -> CalendarResult<bool> {
        Ok(self.repo.count_days()? == 0)
    }

    /// Renders `range` as iCalendar text.
    pub fn export(&self, range: &DateRange) -> CalendarResult<String> {
        let records = self.days(range)?;
        if records.is_empty() {
            warn!("event=calendar_export module=service status=empty range={range}");
        }
        Ok(render_calendar(&records))
    }

    /// Renders `range` and writes it to `path`; returns the number of events.
    pub fn export_to_file(&self, range: &DateRange, path: &Path) -> CalendarResult<usize> {
        let records = self.days(range)?;
        let text = render_calendar(&records);
        std::fs::write(path, text).map_err(|source| CalendarError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "event=calendar_export module=service status=ok range={range} events={} path={}",
            records.len(),
            path.display()
        );
        Ok(records.len())
    }
}

fn fetch_year<F: SourceFetcher>(fetcher: &F, year: i32) -> CalendarResult<Vec<String>> {
    fetcher.fetch_lines(year).map_err(|err| {
        error!(
            "event=ingest_year module=service status=error year={year} error_code=fetch_failed error={err}"
        );
        CalendarError::from(err)
    })
}

fn stage_lines<S: AsRef<str>>(
    year: i32,
    lines: &[S],
) -> CalendarResult<(Vec<DayRecord>, IngestReport)> {
    let (records, report) = prepare_year(year, lines).map_err(|err| {
        error!(
            "event=ingest_year module=service status=error year={year} error_code=decode_failed error={err}"
        );
        err
    })?;
    if report.foreign_records > 0 {
        warn!(
            "event=ingest_year module=service status=warn year={year} foreign_records={}",
            report.foreign_records
        );
    }
    Ok((records, report))
}

fn derive_logged(records: &[DayRecord]) -> CalendarResult<Vec<HolidayAssignment>> {
    derive_holidays(records).map_err(|err| {
        error!(
            "event=holiday_update module=service status=error error_code=derive_failed error={err}"
        );
        CalendarError::from(err)
    })
}

fn log_corrections(expected: usize, changed: usize) {
    if changed < expected {
        warn!(
            "event=apply_corrections module=service status=partial expected={expected} changed={changed}"
        );
    } else {
        info!("event=apply_corrections module=service status=ok changed={changed}");
    }
}

/// Overwrites staged labels; returns the number of dates present.
fn correct_staged(
    staged: &mut BTreeMap<NaiveDate, DayRecord>,
    corrections: &[LabelCorrection],
) -> usize {
    corrections
        .iter()
        .filter_map(|correction| {
            staged
                .get_mut(&correction.date)
                .map(|record| record.lunar_label = correction.lunar_label.to_string())
        })
        .count()
}

/// Applies assignments in order to date-sorted records, so a later
/// assignment to the same day wins. Returns assignments that found a day.
fn assign_staged(records: &mut [DayRecord], assignments: &[HolidayAssignment]) -> usize {
    for record in records.iter_mut() {
        record.holiday = None;
    }
    let mut written = 0;
    for assignment in assignments {
        if let Ok(index) = records.binary_search_by_key(&assignment.date, |record| record.date) {
            records[index].holiday = Some(assignment.holiday.label().to_string());
            written += 1;
        }
    }
    written
}
