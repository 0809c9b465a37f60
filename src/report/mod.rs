//! Fan-in of per-file tallies and presentation of the final report

pub mod aggregate;
pub mod format;

pub use aggregate::{AggregateReport, Aggregator};
pub use format::{format_number, render_json, render_text};
