//! Lexical decoder for one line of the observatory table.
//!
//! Data lines look like `1901年1月6日 十六 星期日 小寒`: a Gregorian date,
//! the lunar label, the weekday, and on some days a solar term. Header and
//! footer lines are interleaved with them and simply do not match.

use crate::model::day_record::DayRecord;
use chrono::NaiveDate;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})年([0-9]{1,2})月([0-9]{1,2})日").expect("valid date prefix regex")
});

const LUNAR_LABEL_FIELD: usize = 1;
const SOLAR_TERM_FIELD: usize = 3;

/// Fields extracted from one data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub date: NaiveDate,
    pub lunar_label: String,
    pub solar_term: Option<String>,
}

impl From<SourceLine> for DayRecord {
    fn from(line: SourceLine) -> Self {
        DayRecord {
            date: line.date,
            lunar_label: line.lunar_label,
            holiday: None,
            solar_term: line.solar_term,
        }
    }
}

/// Decodes one source line, or returns `None` for anything that is not a
/// data line.
///
/// The second whitespace-separated field is the lunar label; when the line
/// has more than three fields the fourth is the solar term.
pub fn decode_line(line: &str) -> Option<SourceLine> {
    let line = line.trim_start_matches('\u{feff}').trim_start();
    let captures = DATE_PREFIX_RE.captures(line)?;

    let year: i32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let day: u32 = captures[3].parse().ok()?;
    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        debug!("event=decode_line module=source status=skip reason=invalid_date year={year} month={month} day={day}");
        return None;
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    let Some(lunar_label) = fields.get(LUNAR_LABEL_FIELD) else {
        debug!("event=decode_line module=source status=skip reason=missing_label date={date}");
        return None;
    };
    let solar_term = (fields.len() > SOLAR_TERM_FIELD).then(|| fields[SOLAR_TERM_FIELD].to_string());

    Some(SourceLine {
        date,
        lunar_label: (*lunar_label).to_string(),
        solar_term,
    })
}

/// Decodes every data line of one source text, skipping the rest.
pub fn decode_lines<I, S>(lines: I) -> Vec<DayRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| decode_line(line.as_ref()))
        .map(DayRecord::from)
        .collect()
}
