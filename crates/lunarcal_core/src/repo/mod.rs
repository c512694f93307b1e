//! Repository layer over the day store.
//!
//! # Responsibility
//! - Define the upsert/scan/update contract the pipeline needs.
//! - Keep SQL details inside the persistence boundary.

pub mod day_repo;
