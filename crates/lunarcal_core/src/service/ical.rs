//! iCalendar (RFC 5545) serialization of day records.
//!
//! # Invariants
//! - One all-day `VEVENT` per record, `DTEND` exactly one day after
//!   `DTSTART` (exclusive end).
//! - Every content line ends in CRLF and is folded at 75 octets without
//!   splitting a UTF-8 character.
//! - Output is deterministic for a given record slice.

use crate::model::day_record::DayRecord;
use log::warn;

pub const PRODUCT_ID: &str = "-//lunarcal//Chinese Lunar Calendar//EN";
pub const CALENDAR_NAME: &str = "农历";
pub const CALENDAR_DESCRIPTION: &str = "中国农历1901-2100, 包括节气. 数据来自香港天文台";

const UID_DOMAIN: &str = "lunarcal";
const ICAL_DATE_FORMAT: &str = "%Y%m%d";
const MAX_LINE_OCTETS: usize = 75;
const CRLF: &str = "\r\n";

/// Renders `records` (expected in date order) as one VCALENDAR document.
///
/// An empty slice yields a valid calendar with no events.
pub fn render_calendar(records: &[DayRecord]) -> String {
    let mut out = String::with_capacity(256 + records.len() * 128);

    push_line(&mut out, "BEGIN:VCALENDAR");
    push_line(&mut out, &format!("PRODID:{PRODUCT_ID}"));
    push_line(&mut out, "VERSION:2.0");
    push_line(&mut out, "CALSCALE:GREGORIAN");
    push_line(&mut out, "METHOD:PUBLISH");
    push_line(&mut out, &format!("X-WR-CALNAME:{}", escape_text(CALENDAR_NAME)));
    push_line(
        &mut out,
        &format!("X-WR-CALDESC:{}", escape_text(CALENDAR_DESCRIPTION)),
    );

    for record in records {
        let Some(end) = record.date.succ_opt() else {
            warn!(
                "event=render_event module=ical status=skip reason=no_next_day date={}",
                record.date
            );
            continue;
        };
        let start = record.date.format(ICAL_DATE_FORMAT);
        push_line(&mut out, "BEGIN:VEVENT");
        push_line(&mut out, &format!("UID:{start}@{UID_DOMAIN}"));
        push_line(&mut out, &format!("DTSTART;VALUE=DATE:{start}"));
        push_line(
            &mut out,
            &format!("DTEND;VALUE=DATE:{}", end.format(ICAL_DATE_FORMAT)),
        );
        push_line(
            &mut out,
            &format!("SUMMARY:{}", escape_text(&record.summary())),
        );
        push_line(&mut out, "END:VEVENT");
    }

    push_line(&mut out, "END:VCALENDAR");
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(&fold_line(line));
    out.push_str(CRLF);
}

/// Escapes a TEXT value: backslash, semicolon, comma and newlines.
pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Folds one content line into 75-octet segments joined by CRLF + space.
pub fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut segment_octets = 0;
    for ch in line.chars() {
        let width = ch.len_utf8();
        if segment_octets + width > MAX_LINE_OCTETS {
            folded.push_str(CRLF);
            folded.push(' ');
            // The leading space counts toward the continuation line.
            segment_octets = 1;
        }
        folded.push(ch);
        segment_octets += width;
    }
    folded
}
