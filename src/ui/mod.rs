//! Plain-text rendering of query results for the terminal.

pub mod tables;

pub use tables::{format_metric, render_correlation, render_headline, render_rows, render_run_summary};
