use chrono::NaiveDate;
use lunarcal_core::db::{open_db, open_db_in_memory};
use lunarcal_core::{
    render_calendar, CalendarError, CalendarService, DateRange, DayRecord, DayRepository,
    DirectorySource, IngestError, MemorySource, SourceError, SqliteDayRepository,
};

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

const SOURCE_2053_TAIL: &str = "\
2053年公曆與農曆日期對照表
公曆日期 農曆日期 星期 節氣
2053年12月7日 廿八 星期日 大雪
2053年12月8日 廿九 星期一
2053年12月9日 星期二 星期二
2053年12月10日 十一月 星期三
";

const SOURCE_2024_SPRING: &str = "\
2024年2月8日 廿八 星期四
2024年2月9日 廿九 星期五
2024年2月10日 正月 星期六
2024年2月11日 初二 星期日
2024年2月24日 十五 星期六
";

#[test]
fn range_with_corrected_day_exports_day_thirty() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());

    let mut source = MemorySource::new();
    source.insert(2053, SOURCE_2053_TAIL);
    let report = service.ingest_year(&source, 2053).unwrap();
    assert_eq!(report.records, 4);
    assert_eq!(report.pending_corrections, 1);

    assert_eq!(service.apply_corrections().unwrap(), 1);
    service.update_holidays().unwrap();

    let range = DateRange::new(ymd(2053, 1, 1), ymd(2053, 12, 31)).unwrap();
    let corrected = service.day(ymd(2053, 12, 9)).unwrap().unwrap();
    assert_eq!(corrected.lunar_label, "三十");

    let text = service.export(&range).unwrap();
    assert!(text.contains("DTSTART;VALUE=DATE:20531209\r\nDTEND;VALUE=DATE:20531210\r\nSUMMARY:三十\r\n"));
    assert!(!text.contains("SUMMARY:星期二"));
    assert!(text.contains("SUMMARY:廿八 大雪\r\n"));
}

#[test]
fn spring_festival_pipeline_annotates_eve_new_year_and_lantern() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());

    let lines: Vec<&str> = SOURCE_2024_SPRING.lines().collect();
    service.ingest_lines(2024, &lines).unwrap();
    assert_eq!(service.update_holidays().unwrap(), 3);

    let holiday = |date| {
        service
            .day(date)
            .unwrap()
            .and_then(|record: DayRecord| record.holiday)
    };
    assert_eq!(holiday(ymd(2024, 2, 9)).as_deref(), Some("除夕"));
    assert_eq!(holiday(ymd(2024, 2, 10)).as_deref(), Some("春节"));
    assert_eq!(holiday(ymd(2024, 2, 24)).as_deref(), Some("元宵"));
    assert_eq!(holiday(ymd(2024, 2, 8)), None);

    let range = DateRange::new(ymd(2024, 2, 9), ymd(2024, 2, 10)).unwrap();
    let text = service.export(&range).unwrap();
    assert!(text.contains("SUMMARY:廿九 除夕\r\n"));
    assert!(text.contains("SUMMARY:正月 春节\r\n"));
}

#[test]
fn reingesting_a_year_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());
    let lines: Vec<&str> = SOURCE_2024_SPRING.lines().collect();

    service.ingest_lines(2024, &lines).unwrap();
    let range = DateRange::new(ymd(2024, 1, 1), ymd(2024, 12, 31)).unwrap();
    let first = service.days(&range).unwrap();
    service.ingest_lines(2024, &lines).unwrap();
    let second = service.days(&range).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.len(), 5);
}

#[test]
fn unknown_label_fails_ingestion_of_that_year() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());

    let err = service
        .ingest_lines(2024, &["2024年3月1日 星期五 星期五"])
        .unwrap_err();
    assert!(matches!(
        err,
        CalendarError::Ingest(IngestError::UnknownLabel { year: 2024, .. })
    ));
    assert!(service.is_empty().unwrap());
}

#[test]
fn rebuild_stops_at_first_missing_year() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());

    let mut source = MemorySource::new();
    source.insert(1901, "1901年1月1日 十一 星期二\n");
    let err = service.rebuild(&source).unwrap_err();
    assert!(matches!(
        err,
        CalendarError::Source(SourceError::Missing { year: 1902 })
    ));
}

fn source_for_every_year() -> MemorySource {
    let mut source = MemorySource::new();
    for year in 1901..=2100 {
        source.insert(
            year,
            format!(
                "{year}年1月1日 十一 星期一\n{year}年2月1日 正月 星期一\n{year}年2月15日 十五 星期一\n"
            ),
        );
    }
    source
}

#[test]
fn failed_rebuild_keeps_previous_store() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());
    service.rebuild(&source_for_every_year()).unwrap();
    let range = DateRange::new(ymd(1901, 1, 1), ymd(2100, 12, 31)).unwrap();
    let before = service.days(&range).unwrap();

    let mut partial = MemorySource::new();
    partial.insert(1901, "1901年1月1日 十一 星期二\n");
    let err = service.rebuild(&partial).unwrap_err();
    assert!(matches!(
        err,
        CalendarError::Source(SourceError::Missing { year: 1902 })
    ));

    assert_eq!(service.days(&range).unwrap(), before);
    let new_year = service.day(ymd(2000, 2, 1)).unwrap().unwrap();
    assert_eq!(new_year.holiday.as_deref(), Some("春节"));
}

#[test]
fn rebuild_with_bad_label_late_in_table_keeps_previous_store() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());
    service.rebuild(&source_for_every_year()).unwrap();

    let mut source = source_for_every_year();
    source.insert(2099, "2099年3月1日 星期日 星期日\n");
    let err = service.rebuild(&source).unwrap_err();
    assert!(matches!(
        err,
        CalendarError::Ingest(IngestError::UnknownLabel { year: 2099, .. })
    ));
    assert_eq!(service.day(ymd(2099, 1, 1)).unwrap().unwrap().lunar_label, "十一");
}

#[test]
fn corrections_fix_each_known_bad_date() {
    let bad_dates = [
        ymd(2036, 1, 27),
        ymd(2053, 12, 9),
        ymd(2056, 3, 15),
        ymd(2063, 7, 25),
        ymd(2063, 10, 21),
        ymd(2063, 12, 19),
    ];
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteDayRepository::try_new(&mut conn).unwrap();
    let mut seeded: Vec<DayRecord> = bad_dates
        .iter()
        .map(|date| DayRecord::new(*date, "星期一"))
        .collect();
    seeded.push(DayRecord::new(ymd(2063, 12, 20), "星期二"));
    repo.upsert_days(&seeded).unwrap();

    let mut service = CalendarService::new(repo);
    assert_eq!(service.apply_corrections().unwrap(), 6);

    for date in bad_dates {
        assert_eq!(service.day(date).unwrap().unwrap().lunar_label, "三十", "{date}");
    }
    assert_eq!(
        service.day(ymd(2063, 12, 20)).unwrap().unwrap().lunar_label,
        "星期二"
    );
}

#[test]
fn rebuild_from_directory_covers_every_year() {
    let dir = tempfile::tempdir().unwrap();
    for year in 1901..=2100 {
        let mut text = String::from("公曆與農曆日期對照表\n");
        text.push_str(&format!("{year}年1月1日 十一 星期一\n"));
        text.push_str(&format!("{year}年2月1日 正月 星期一\n"));
        text.push_str(&format!("{year}年2月15日 十五 星期一\n"));
        std::fs::write(dir.path().join(format!("T{year}c.txt")), text).unwrap();
    }
    let db_path = dir.path().join("lunarcal.sqlite");
    let mut conn = open_db(&db_path).unwrap();
    let mut service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());

    let report = service.rebuild(&DirectorySource::new(dir.path())).unwrap();
    assert_eq!(report.years, 200);
    assert_eq!(report.records, 600);
    assert_eq!(report.corrections, 0);
    // New year, its eve and lantern in every year. The eve of 1901 lands on
    // a day whose own month was still unknown.
    assert_eq!(report.holidays, 600);

    let first = service.day(ymd(1901, 1, 1)).unwrap().unwrap();
    assert_eq!(first.holiday.as_deref(), Some("除夕"));
}

#[test]
fn serializer_emits_one_block_per_record_with_next_day_end() {
    let records = vec![
        DayRecord::new(ymd(2024, 2, 28), "十九"),
        DayRecord::new(ymd(2024, 2, 29), "二十"),
        DayRecord::new(ymd(2024, 12, 31), "十二月"),
        DayRecord::new(ymd(2024, 4, 4), "廿六")
            .with_holiday("寒食")
            .with_solar_term("清明"),
    ];
    let text = render_calendar(&records);

    assert_eq!(text.matches("BEGIN:VEVENT\r\n").count(), records.len());
    assert_eq!(text.matches("END:VEVENT\r\n").count(), records.len());
    assert!(text.contains("DTSTART;VALUE=DATE:20240229\r\nDTEND;VALUE=DATE:20240301\r\n"));
    assert!(text.contains("DTSTART;VALUE=DATE:20241231\r\nDTEND;VALUE=DATE:20250101\r\n"));
    assert!(text.contains("SUMMARY:廿六 寒食 清明\r\n"));

    let starts: Vec<NaiveDate> = text
        .lines()
        .filter_map(|line| line.strip_prefix("DTSTART;VALUE=DATE:"))
        .map(|value| NaiveDate::parse_from_str(value, "%Y%m%d").unwrap())
        .collect();
    let ends: Vec<NaiveDate> = text
        .lines()
        .filter_map(|line| line.strip_prefix("DTEND;VALUE=DATE:"))
        .map(|value| NaiveDate::parse_from_str(value, "%Y%m%d").unwrap())
        .collect();
    assert_eq!(starts.len(), ends.len());
    for (start, end) in starts.iter().zip(&ends) {
        assert_eq!((*end - *start).num_days(), 1);
    }
}

#[test]
fn export_of_empty_range_is_valid_calendar() {
    let mut conn = open_db_in_memory().unwrap();
    let service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());

    let range = DateRange::new(ymd(1999, 1, 1), ymd(1999, 1, 31)).unwrap();
    let text = service.export(&range).unwrap();
    assert!(text.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(text.ends_with("END:VCALENDAR\r\n"));
    assert!(text.contains("PRODID:"));
    assert!(text.contains("VERSION:2.0\r\n"));
    assert!(!text.contains("VEVENT"));
}

#[test]
fn export_to_file_writes_utf8() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db_in_memory().unwrap();
    let mut service = CalendarService::new(SqliteDayRepository::try_new(&mut conn).unwrap());
    let lines: Vec<&str> = SOURCE_2024_SPRING.lines().collect();
    service.ingest_lines(2024, &lines).unwrap();

    let path = dir.path().join("out.ics");
    let range = DateRange::new(ymd(2024, 2, 1), ymd(2024, 2, 29)).unwrap();
    let events = service.export_to_file(&range, &path).unwrap();

    assert_eq!(events, 5);
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("SUMMARY:正月\r\n"));
}

#[test]
fn day_record_serializes_with_iso_date() {
    let record = DayRecord::new(ymd(2024, 2, 10), "正月").with_holiday("春节");
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["date"], "2024-02-10");
    assert_eq!(json["lunar_label"], "正月");
    assert_eq!(json["holiday"], "春节");
    assert!(json["solar_term"].is_null());

    let decoded: DayRecord = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, record);
}
