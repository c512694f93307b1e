//! Day record domain model.
//!
//! # Responsibility
//! - Define the one-row-per-Gregorian-day shape kept in the day store.
//! - Decode the raw lunar label on demand.
//!
//! # Invariants
//! - `date` is the unique key; records order by `date`.
//! - `lunar_label` is the label as published (or as corrected), never the
//!   decoded number. Decoding is recomputed from it every time.

use crate::model::lunar_label::{LabelError, LunarLabel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One Gregorian day with its lunar annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Serialized as ISO `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Day label (`十五`) or, on the first day of a month, month label (`正月`).
    pub lunar_label: String,
    /// Set by holiday derivation only.
    pub holiday: Option<String>,
    /// One of the 24 solar terms, when the source lists one for this day.
    pub solar_term: Option<String>,
}

impl DayRecord {
    /// Creates a record with no holiday and no solar term.
    pub fn new(date: NaiveDate, lunar_label: impl Into<String>) -> Self {
        Self {
            date,
            lunar_label: lunar_label.into(),
            holiday: None,
            solar_term: None,
        }
    }

    pub fn with_solar_term(mut self, solar_term: impl Into<String>) -> Self {
        self.solar_term = Some(solar_term.into());
        self
    }

    pub fn with_holiday(mut self, holiday: impl Into<String>) -> Self {
        self.holiday = Some(holiday.into());
        self
    }

    /// Decodes `lunar_label` through the label dictionary.
    pub fn lunar(&self) -> Result<LunarLabel, LabelError> {
        LunarLabel::parse(&self.lunar_label)
    }

    /// Event title: lunar label, then holiday, then solar term, space-joined.
    pub fn summary(&self) -> String {
        let mut parts = vec![self.lunar_label.as_str()];
        parts.extend(self.holiday.as_deref());
        parts.extend(self.solar_term.as_deref());
        parts.join(" ")
    }

    pub fn has_solar_term(&self, term: &str) -> bool {
        self.solar_term.as_deref() == Some(term)
    }
}
