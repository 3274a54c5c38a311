//! Waste data aggregation and reporting.
//!
//! This module buckets stored ledger records into 12-slot monthly series,
//! derives summary totals, and assembles the yearly report.

pub mod aggregate;
pub mod types;

pub use aggregate::{Aggregator, bucket_by_month};
pub use types::{MONTHS, MonthlySeries, Summary, WasteReport};
