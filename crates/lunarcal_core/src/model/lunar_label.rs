//! Lunar label dictionary.
//!
//! # Responsibility
//! - Map published day labels (`初二`..`三十`) to day numbers 2..=30.
//! - Map published month labels (`正月`..`十二月`, `閏正月`..`閏十二月`) to
//!   lunar months, encoded as `1..=12` and `101..=112` for leap months.
//!
//! # Invariants
//! - Both tables are bijections on their domain: decoding then encoding a
//!   label returns the identical label.
//! - `初一` never appears in the source. Day one of a month is published as
//!   the month label itself, so a month label always decodes to day 1.
//! - Labels outside both tables are a hard [`LabelError`].

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Offset added to the month number of an intercalary month.
pub const LEAP_MONTH_OFFSET: u16 = 100;

/// Day labels for days 2..=30; index 0 is day 2.
const DAY_LABELS: [&str; 29] = [
    "初二", "初三", "初四", "初五", "初六", "初七", "初八", "初九", "初十", "十一", "十二",
    "十三", "十四", "十五", "十六", "十七", "十八", "十九", "二十", "廿一", "廿二", "廿三",
    "廿四", "廿五", "廿六", "廿七", "廿八", "廿九", "三十",
];

const MONTH_LABELS: [&str; 12] = [
    "正月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "十一月",
    "十二月",
];

const LEAP_MONTH_LABELS: [&str; 12] = [
    "閏正月",
    "閏二月",
    "閏三月",
    "閏四月",
    "閏五月",
    "閏六月",
    "閏七月",
    "閏八月",
    "閏九月",
    "閏十月",
    "閏十一月",
    "閏十二月",
];

/// Label published for the thirtieth day of a long lunar month.
pub const DAY_THIRTY_LABEL: &str = "三十";

/// Label that could not be found in either lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelError {
    label: String,
}

impl LabelError {
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Display for LabelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown lunar label `{}`", self.label)
    }
}

impl Error for LabelError {}

/// A lunar month, ordinary or intercalary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LunarMonth {
    number: u8,
    leap: bool,
}

impl LunarMonth {
    /// Ordinary month `1..=12`.
    pub fn common(number: u8) -> Option<Self> {
        (1..=12).contains(&number).then_some(Self {
            number,
            leap: false,
        })
    }

    /// Intercalary month following ordinary month `number`.
    pub fn leap(number: u8) -> Option<Self> {
        (1..=12)
            .contains(&number)
            .then_some(Self { number, leap: true })
    }

    /// Decodes the numeric form (`1..=12` or `101..=112`).
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1..=12 => Self::common(code as u8),
            101..=112 => Self::leap((code - LEAP_MONTH_OFFSET) as u8),
            _ => None,
        }
    }

    /// Numeric form: month number, plus [`LEAP_MONTH_OFFSET`] for leap months.
    pub fn code(self) -> u16 {
        let base = u16::from(self.number);
        if self.leap {
            base + LEAP_MONTH_OFFSET
        } else {
            base
        }
    }

    pub fn number(self) -> u8 {
        self.number
    }

    pub fn is_leap(self) -> bool {
        self.leap
    }

    /// Published label, e.g. `正月` or `閏四月`.
    pub fn label(self) -> &'static str {
        let index = usize::from(self.number - 1);
        if self.leap {
            LEAP_MONTH_LABELS[index]
        } else {
            MONTH_LABELS[index]
        }
    }
}

/// Decoded form of a published lunar label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LunarLabel {
    /// Day `2..=30` inside the current lunar month.
    Day(u8),
    /// First day of the named month.
    MonthStart(LunarMonth),
}

impl LunarLabel {
    /// Decodes a published label, trying day labels first.
    pub fn parse(label: &str) -> Result<Self, LabelError> {
        if let Some(day) = decode_day(label) {
            return Ok(Self::Day(day));
        }
        decode_month(label)
            .map(Self::MonthStart)
            .ok_or_else(|| LabelError {
                label: label.to_string(),
            })
    }

    /// Day within the lunar month; month labels mean day 1.
    pub fn day(self) -> u8 {
        match self {
            Self::Day(day) => day,
            Self::MonthStart(_) => 1,
        }
    }

    /// The month this label opens, if it is a month label.
    pub fn month_start(self) -> Option<LunarMonth> {
        match self {
            Self::Day(_) => None,
            Self::MonthStart(month) => Some(month),
        }
    }

    /// Re-encodes to the published label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day(day) => day_label(day).unwrap_or(DAY_THIRTY_LABEL),
            Self::MonthStart(month) => month.label(),
        }
    }
}

impl FromStr for LunarLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for LunarLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Looks up a day label. Returns `None` for anything outside `初二..=三十`.
pub fn decode_day(label: &str) -> Option<u8> {
    DAY_LABELS
        .iter()
        .position(|candidate| *candidate == label)
        .map(|index| index as u8 + 2)
}

/// Looks up an ordinary or leap month label.
pub fn decode_month(label: &str) -> Option<LunarMonth> {
    if let Some(index) = MONTH_LABELS.iter().position(|candidate| *candidate == label) {
        return LunarMonth::common(index as u8 + 1);
    }
    LEAP_MONTH_LABELS
        .iter()
        .position(|candidate| *candidate == label)
        .and_then(|index| LunarMonth::leap(index as u8 + 1))
}

/// Published label for day `2..=30`.
pub fn day_label(day: u8) -> Option<&'static str> {
    match day {
        2..=30 => Some(DAY_LABELS[usize::from(day - 2)]),
        _ => None,
    }
}
