//! Pipeline stages and their orchestration.
//!
//! # Responsibility
//! - Keep each stage a plain transformation over day records.
//! - Keep the orchestrating service storage-agnostic.

pub mod calendar_service;
pub mod correction;
pub mod holiday_service;
pub mod ical;
pub mod ingest_service;
