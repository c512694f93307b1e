//! Supported span, date ranges and on-disk locations.
//!
//! # Responsibility
//! - Define the Gregorian span covered by the source table.
//! - Validate requested export ranges before any processing.
//! - Resolve default file locations for the store and generated calendars.
//!
//! # Invariants
//! - A [`DateRange`] always satisfies `FIRST_DAY <= start <= end <= LAST_DAY`.

use chrono::{Datelike, NaiveDate};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Years published by the source table.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1901..=2100;

const DB_DIR_NAME: &str = "db";
const DB_FILE_NAME: &str = "lunarcal.sqlite";
const SOURCE_DIR_NAME: &str = "source";

/// First day covered by the source table.
pub fn first_supported_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(*SUPPORTED_YEARS.start(), 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Last day covered by the source table.
pub fn last_supported_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(*SUPPORTED_YEARS.end(), 12, 31).unwrap_or(NaiveDate::MAX)
}

/// Reason a requested range was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    StartBeforeFirstDay(NaiveDate),
    EndAfterLastDay(NaiveDate),
    StartAfterLastDay(NaiveDate),
    EndBeforeFirstDay(NaiveDate),
    Reversed { start: NaiveDate, end: NaiveDate },
}

impl Display for RangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StartBeforeFirstDay(start) => write!(
                f,
                "start date {start} is before {}, the first day of the source table",
                first_supported_day()
            ),
            Self::EndAfterLastDay(end) => write!(
                f,
                "end date {end} is after {}, the last day of the source table",
                last_supported_day()
            ),
            Self::StartAfterLastDay(start) => write!(
                f,
                "start date {start} is after {}, the last day of the source table",
                last_supported_day()
            ),
            Self::EndBeforeFirstDay(end) => write!(
                f,
                "end date {end} is before {}, the first day of the source table",
                first_supported_day()
            ),
            Self::Reversed { start, end } => {
                write!(f, "end date {end} is before start date {start}")
            }
        }
    }
}

impl Error for RangeError {}

/// Inclusive Gregorian range inside the supported span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Validates `[start, end]` against the supported span.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start < first_supported_day() {
            return Err(RangeError::StartBeforeFirstDay(start));
        }
        if end > last_supported_day() {
            return Err(RangeError::EndAfterLastDay(end));
        }
        if end < start {
            return Err(RangeError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Jan 1 of the previous year through Dec 31 of the next year, clamped to
    /// the supported span.
    pub fn around(today: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(today.year() - 1, 1, 1)
            .map_or(first_supported_day(), |day| day.max(first_supported_day()));
        let end = NaiveDate::from_ymd_opt(today.year() + 1, 12, 31)
            .map_or(last_supported_day(), |day| day.min(last_supported_day()));
        Self {
            start: start.min(last_supported_day()),
            end: end.max(first_supported_day()),
        }
    }

    /// Range from optional bounds; a missing bound comes from the default
    /// window around the given one.
    ///
    /// With only `start`, the end is the default window's end, or Dec 31 of
    /// the year after `start` when `start` lies past that window. A lone
    /// `end` mirrors this.
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self, RangeError> {
        let window = Self::around(today);
        match (start, end) {
            (None, None) => Ok(window),
            (Some(start), Some(end)) => Self::new(start, end),
            (Some(start), None) => {
                if start > last_supported_day() {
                    return Err(RangeError::StartAfterLastDay(start));
                }
                let anchor = if start > window.end {
                    Self::around(start)
                } else {
                    window
                };
                Self::new(start, anchor.end)
            }
            (None, Some(end)) => {
                if end < first_supported_day() {
                    return Err(RangeError::EndBeforeFirstDay(end));
                }
                let anchor = if end < window.start {
                    Self::around(end)
                } else {
                    window
                };
                Self::new(anchor.start, end)
            }
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl Display for DateRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// File name for a generated calendar.
///
/// `None` is the default rolling window and gets a stable name so that
/// calendar clients subscribed to the file keep following it.
pub fn output_file_name(range: Option<&DateRange>) -> String {
    match range {
        Some(range) => format!("chinese_lunar_{}_{}.ics", range.start(), range.end()),
        None => "chinese_lunar_prev_year_next_year.ics".to_string(),
    }
}

/// On-disk locations used by a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarConfig {
    /// SQLite day store.
    pub db_path: PathBuf,
    /// Directory holding pre-downloaded `T{year}c.txt` files.
    pub source_dir: PathBuf,
    /// Directory receiving generated `.ics` files.
    pub output_dir: PathBuf,
}

impl CalendarConfig {
    /// Default layout under one application directory:
    /// `db/lunarcal.sqlite`, `source/`, and calendars in the directory itself.
    pub fn in_dir(app_dir: impl AsRef<Path>) -> Self {
        let app_dir = app_dir.as_ref();
        Self {
            db_path: app_dir.join(DB_DIR_NAME).join(DB_FILE_NAME),
            source_dir: app_dir.join(SOURCE_DIR_NAME),
            output_dir: app_dir.to_path_buf(),
        }
    }

    /// Whether the day store has been built before.
    pub fn store_exists(&self) -> bool {
        self.db_path.is_file()
    }

    pub fn output_path(&self, range: Option<&DateRange>) -> PathBuf {
        self.output_dir.join(output_file_name(range))
    }
}
