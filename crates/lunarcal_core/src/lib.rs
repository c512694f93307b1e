//! Chinese lunar calendar pipeline.
//!
//! Decodes the Hong Kong Observatory 1901–2100 lunar table into per-day
//! records, repairs its known errors, derives traditional holidays and
//! exports date ranges as iCalendar files.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod source;

pub use config::{CalendarConfig, DateRange, RangeError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::day_record::DayRecord;
pub use model::holiday::{Holiday, HolidayAssignment};
pub use model::lunar_label::{LabelError, LunarLabel, LunarMonth};
pub use repo::day_repo::{DayRepository, RepoError, RepoResult, SqliteDayRepository};
pub use service::calendar_service::{
    CalendarError, CalendarResult, CalendarService, RebuildReport,
};
pub use service::holiday_service::{derive_holidays, HolidayError};
pub use service::ical::render_calendar;
pub use service::ingest_service::{IngestError, IngestReport};
pub use source::{DirectorySource, MemorySource, SourceError, SourceFetcher};
