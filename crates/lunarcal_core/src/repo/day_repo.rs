//! Day store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist one row per Gregorian date.
//! - Provide upsert-by-date, ordered range scans and point updates by date.
//!
//! # Invariants
//! - `upsert_days` is insert-or-replace by date: the last write for a date
//!   wins and replaces the whole row, holiday included.
//! - Batch writes commit as one transaction.
//! - Scans always return rows in ascending date order.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::config::DateRange;
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::day_record::DayRecord;
use crate::model::holiday::HolidayAssignment;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DAY_SELECT_SQL: &str = "SELECT
    date,
    lunar_label,
    holiday,
    solar_term
FROM days";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for day persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredColumn(&'static str),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "day store connection is at schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredColumn(column) => {
                write!(f, "day store is missing required column `days.{column}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted day data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredColumn(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the date-keyed day store.
pub trait DayRepository {
    /// Inserts or fully replaces each record by date; returns rows written.
    fn upsert_days(&mut self, records: &[DayRecord]) -> RepoResult<usize>;
    /// Loads one day by date.
    fn get_day(&self, date: NaiveDate) -> RepoResult<Option<DayRecord>>;
    /// Loads all days, or those inside `range`, in ascending date order.
    fn list_days(&self, range: Option<&DateRange>) -> RepoResult<Vec<DayRecord>>;
    /// Overwrites the lunar label of existing days; returns rows changed.
    fn set_lunar_labels(&mut self, labels: &[(NaiveDate, &str)]) -> RepoResult<usize>;
    /// Clears every holiday, then applies `assignments` in order.
    fn replace_holidays(&mut self, assignments: &[HolidayAssignment]) -> RepoResult<usize>;
    /// Number of stored days.
    fn count_days(&self) -> RepoResult<u64>;
    /// Replaces the whole store with `records` in one transaction; returns
    /// rows written. On error the previous contents are kept.
    fn replace_all_days(&mut self, records: &[DayRecord]) -> RepoResult<usize>;
}

/// SQLite-backed day repository.
pub struct SqliteDayRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteDayRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_day_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DayRepository for SqliteDayRepository<'_> {
    fn upsert_days(&mut self, records: &[DayRecord]) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let written = insert_days(&tx, records)?;
        tx.commit()?;
        Ok(written)
    }

    fn get_day(&self, date: NaiveDate) -> RepoResult<Option<DayRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{DAY_SELECT_SQL} WHERE date = ?1;"))?;
        let record = stmt
            .query_row([date_to_db(date)], |row| Ok(parse_day_row(row)))
            .optional()?;
        record.transpose()
    }

    fn list_days(&self, range: Option<&DateRange>) -> RepoResult<Vec<DayRecord>> {
        let (start, end) = match range {
            Some(range) => (date_to_db(range.start()), date_to_db(range.end())),
            None => (String::new(), String::from("9999-12-31")),
        };
        let mut stmt = self.conn.prepare_cached(&format!(
            "{DAY_SELECT_SQL}
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date ASC;"
        ))?;

        let mut rows = stmt.query(params![start, end])?;
        let mut days = Vec::new();
        while let Some(row) = rows.next()? {
            days.push(parse_day_row(row)?);
        }
        Ok(days)
    }

    fn set_lunar_labels(&mut self, labels: &[(NaiveDate, &str)]) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut changed = 0;
        {
            let mut stmt = tx.prepare_cached("UPDATE days SET lunar_label = ?2 WHERE date = ?1;")?;
            for (date, label) in labels {
                changed += stmt.execute(params![date_to_db(*date), label])?;
            }
        }
        tx.commit()?;
        Ok(changed)
    }

    fn replace_holidays(&mut self, assignments: &[HolidayAssignment]) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("UPDATE days SET holiday = NULL WHERE holiday IS NOT NULL;", [])?;
        let mut changed = 0;
        {
            let mut stmt = tx.prepare_cached("UPDATE days SET holiday = ?2 WHERE date = ?1;")?;
            for assignment in assignments {
                changed += stmt.execute(params![
                    date_to_db(assignment.date),
                    assignment.holiday.label()
                ])?;
            }
        }
        tx.commit()?;
        Ok(changed)
    }

    fn count_days(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM days;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative day count `{count}`")))
    }

    fn replace_all_days(&mut self, records: &[DayRecord]) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM days;", [])?;
        let written = insert_days(&tx, records)?;
        tx.commit()?;
        Ok(written)
    }
}

fn insert_days(conn: &Connection, records: &[DayRecord]) -> RepoResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR REPLACE INTO days (date, lunar_label, holiday, solar_term)
         VALUES (?1, ?2, ?3, ?4);",
    )?;
    let mut written = 0;
    for record in records {
        written += stmt.execute(params![
            date_to_db(record.date),
            record.lunar_label.as_str(),
            record.holiday.as_deref(),
            record.solar_term.as_deref(),
        ])?;
    }
    Ok(written)
}

fn parse_day_row(row: &Row<'_>) -> RepoResult<DayRecord> {
    let date_text: String = row.get("date")?;
    let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!("invalid date value `{date_text}` in days.date"))
    })?;

    let lunar_label: String = row.get("lunar_label")?;
    if lunar_label.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty lunar label for {date_text} in days.lunar_label"
        )));
    }

    Ok(DayRecord {
        date,
        lunar_label,
        holiday: row.get("holiday")?,
        solar_term: row.get("solar_term")?,
    })
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn ensure_day_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let mut stmt = conn.prepare("PRAGMA table_info(days);")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    for column in ["date", "lunar_label", "holiday", "solar_term"] {
        if !columns.iter().any(|existing| existing == column) {
            return Err(RepoError::MissingRequiredColumn(column));
        }
    }

    Ok(())
}
