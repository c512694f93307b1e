//! Known transcription errors in the observatory table.
//!
//! On these six dates the published lunar label is a weekday name. Each one
//! is the thirtieth day of its lunar month.

use crate::model::lunar_label::DAY_THIRTY_LABEL;
use chrono::NaiveDate;

const KNOWN_BAD_DATES: [(i32, u32, u32); 6] = [
    (2036, 1, 27),
    (2053, 12, 9),
    (2056, 3, 15),
    (2063, 7, 25),
    (2063, 10, 21),
    (2063, 12, 19),
];

/// One `(date, label)` overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelCorrection {
    pub date: NaiveDate,
    pub lunar_label: &'static str,
}

/// The fixed correction list, in date order.
pub fn known_corrections() -> Vec<LabelCorrection> {
    KNOWN_BAD_DATES
        .iter()
        .filter_map(|&(year, month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .map(|date| LabelCorrection {
            date,
            lunar_label: DAY_THIRTY_LABEL,
        })
        .collect()
}

/// Whether ingestion should accept an undecodable label on `date` because
/// correction will overwrite it.
pub fn is_known_bad_date(date: NaiveDate) -> bool {
    known_corrections()
        .iter()
        .any(|correction| correction.date == date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_corrections_all_day_thirty() {
        let corrections = known_corrections();
        let dates: Vec<String> = corrections.iter().map(|c| c.date.to_string()).collect();
        assert_eq!(
            dates,
            [
                "2036-01-27",
                "2053-12-09",
                "2056-03-15",
                "2063-07-25",
                "2063-10-21",
                "2063-12-19"
            ]
        );
        assert!(corrections.iter().all(|c| c.lunar_label == "三十"));
    }

    #[test]
    fn bad_date_lookup() {
        assert!(is_known_bad_date(NaiveDate::from_ymd_opt(2053, 12, 9).unwrap()));
        assert!(!is_known_bad_date(NaiveDate::from_ymd_opt(2053, 12, 10).unwrap()));
    }
}
