//! Domain model for the lunar day table.
//!
//! # Responsibility
//! - Define the day record kept per Gregorian date.
//! - Hold the fixed lookup data: lunar labels and traditional holidays.

pub mod day_record;
pub mod holiday;
pub mod lunar_label;
