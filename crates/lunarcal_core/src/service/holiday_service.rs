//! Traditional holiday derivation.
//!
//! # Responsibility
//! - Scan all day records once, in date order, and decide which days carry
//!   which of the eleven traditional holidays.
//!
//! # Invariants
//! - Derivation is a pure function of the full record set. Input order does
//!   not matter; records are scanned by ascending date.
//! - The only carried state is the current lunar month and the previous
//!   record's date ([`ScanState`]).
//! - Nothing is derived before the first month label is seen, since the
//!   lunar month is unknown until then.
//! - Assignments are returned in scan order. When two target the same day,
//!   applying them in order lets the later one win.

use crate::model::day_record::DayRecord;
use crate::model::holiday::{Holiday, HolidayAssignment, QINGMING};
use crate::model::lunar_label::{LabelError, LunarMonth};
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolidayError {
    UnknownLabel { date: NaiveDate, source: LabelError },
    DuplicateDate(NaiveDate),
}

impl Display for HolidayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLabel { date, source } => {
                write!(f, "cannot derive holidays at {date}: {source}")
            }
            Self::DuplicateDate(date) => write!(f, "day {date} appears more than once"),
        }
    }
}

impl Error for HolidayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnknownLabel { source, .. } => Some(source),
            Self::DuplicateDate(_) => None,
        }
    }
}

/// State carried from one record to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ScanState {
    month: Option<LunarMonth>,
    previous: Option<NaiveDate>,
}

impl ScanState {
    /// Consumes one record, pushing any holidays it implies onto `out`.
    fn step(
        self,
        record: &DayRecord,
        out: &mut Vec<HolidayAssignment>,
    ) -> Result<Self, HolidayError> {
        let label = record.lunar().map_err(|source| HolidayError::UnknownLabel {
            date: record.date,
            source,
        })?;
        let month = label.month_start().or(self.month);
        let next = Self {
            month,
            previous: Some(record.date),
        };

        let Some(month) = month else {
            return Ok(next);
        };

        if let Some(holiday) = holiday_on(month, label.day()) {
            out.push(HolidayAssignment {
                date: record.date,
                holiday,
            });
            if holiday == Holiday::LunarNewYear {
                self.push_eve(Holiday::NewYearsEve, out);
            }
        }

        if record.has_solar_term(QINGMING) {
            self.push_eve(Holiday::ColdFood, out);
        }

        Ok(next)
    }

    fn push_eve(self, holiday: Holiday, out: &mut Vec<HolidayAssignment>) {
        if let Some(date) = self.previous {
            out.push(HolidayAssignment { date, holiday });
        }
    }
}

/// Fixed lunar (month, day) observances. Leap months never match.
fn holiday_on(month: LunarMonth, day: u8) -> Option<Holiday> {
    match (month.code(), day) {
        (12, 8) => Some(Holiday::Laba),
        (1, 1) => Some(Holiday::LunarNewYear),
        (1, 15) => Some(Holiday::Lantern),
        (5, 5) => Some(Holiday::DragonBoat),
        (7, 7) => Some(Holiday::DoubleSeventh),
        (7, 15) => Some(Holiday::Ghost),
        (8, 15) => Some(Holiday::MidAutumn),
        (9, 9) => Some(Holiday::DoubleNinth),
        (10, 15) => Some(Holiday::Xiayuan),
        _ => None,
    }
}

/// Derives every holiday assignment for `records`.
///
/// # Errors
/// - [`HolidayError::UnknownLabel`] when a label is outside the dictionary.
/// - [`HolidayError::DuplicateDate`] when two records share a date.
pub fn derive_holidays(records: &[DayRecord]) -> Result<Vec<HolidayAssignment>, HolidayError> {
    let mut ordered: Vec<&DayRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.date);
    if let Some(pair) = ordered.windows(2).find(|pair| pair[0].date == pair[1].date) {
        return Err(HolidayError::DuplicateDate(pair[0].date));
    }

    let mut assignments = Vec::new();
    ordered
        .into_iter()
        .try_fold(ScanState::default(), |state, record| {
            state.step(record, &mut assignments)
        })?;
    Ok(assignments)
}
