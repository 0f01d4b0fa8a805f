use std::fmt::Write;

use crate::analysis::{CorrelationMatrix, HeadlineMetrics};
use crate::engine::{CoinOutcome, RunSummary};
use crate::models::DerivedRow;
use crate::utils::time_utils::epoch_ms_to_utc;

const NOT_AVAILABLE: &str = "N/A";

/// Null renders as N/A, a numeric anomaly as NaN.
pub fn format_metric(value: Option<f64>, decimals: usize) -> String {
    match value {
        None => NOT_AVAILABLE.to_string(),
        Some(v) if v.is_nan() => "NaN".to_string(),
        Some(v) => format!("{:.*}", decimals, v),
    }
}

fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:+.2}%", v),
        other => format_metric(other, 2),
    }
}

pub fn render_headline(metrics: &HeadlineMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} at {} UTC", metrics.coin, epoch_ms_to_utc(metrics.timestamp_ms));
    let _ = writeln!(out, "  Price            {}", format_metric(metrics.price, 4));
    let _ = writeln!(out, "  1h Return        {}", format_pct(metrics.return_1h_pct));
    let _ = writeln!(out, "  24h MA           {}", format_metric(metrics.ma_24h, 4));
    let _ = writeln!(out, "  24h Volatility   {}", format_metric(metrics.volatility_24h, 6));
    let _ = writeln!(out, "  24h Momentum     {}", format_metric(metrics.momentum_24h, 6));
    out
}

pub fn render_rows(rows: &[DerivedRow]) -> String {
    if rows.is_empty() {
        return "No data in the selected window.\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20} {:>14} {:>18} {:>18} {:>10} {:>14} {:>10}",
        "timestamp (UTC)", "price", "market_cap", "total_volume", "return_1h", "ma_24h", "momentum"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<20} {:>14} {:>18} {:>18} {:>10} {:>14} {:>10}",
            epoch_ms_to_utc(row.timestamp_ms),
            format_metric(row.price, 4),
            format_metric(row.market_cap, 0),
            format_metric(row.total_volume, 0),
            format_metric(row.return_1h, 5),
            format_metric(row.ma_24h, 4),
            format_metric(row.momentum_24h, 5),
        );
    }
    out
}

pub fn render_correlation(matrix: &CorrelationMatrix) -> String {
    if matrix.is_empty() {
        return "No coins to correlate.\n".to_string();
    }
    let width = matrix.coins.iter().map(String::len).max().unwrap_or(0).max(8);
    let mut out = String::new();
    let _ = write!(out, "{:<width$}", "", width = width);
    for coin in &matrix.coins {
        let _ = write!(out, " {:>width$}", coin, width = width);
    }
    out.push('\n');
    for (coin, row) in matrix.coins.iter().zip(&matrix.values) {
        let _ = write!(out, "{:<width$}", coin, width = width);
        for value in row {
            let cell = if value.is_nan() {
                "NaN".to_string()
            } else {
                format!("{:.3}", value)
            };
            let _ = write!(out, " {:>width$}", cell, width = width);
        }
        out.push('\n');
    }
    out
}

pub fn render_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Source: {}", summary.source);
    for outcome in &summary.outcomes {
        let line = match outcome {
            CoinOutcome::Derived { coin, rows } => format!("  {:<16} {} rows", coin, rows),
            CoinOutcome::NoData(missing) => format!("  {}", missing),
            CoinOutcome::Failed { coin, reason } => format!("  {:<16} failed: {}", coin, reason),
        };
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(out, "Rows written: {}", summary.rows_written);
    if summary.duplicates_removed > 0 {
        let _ = writeln!(out, "Duplicates removed: {}", summary.duplicates_removed);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_nan_render_differently() {
        assert_eq!(format_metric(None, 2), "N/A");
        assert_eq!(format_metric(Some(f64::NAN), 2), "NaN");
        assert_eq!(format_metric(Some(1.23456), 2), "1.23");
        assert_eq!(format_pct(Some(21.0)), "+21.00%");
        assert_eq!(format_pct(None), "N/A");
    }

    #[test]
    fn empty_inputs_render_a_message() {
        assert!(render_rows(&[]).starts_with("No data"));
        assert!(render_correlation(&CorrelationMatrix::default()).starts_with("No coins"));
    }

    #[test]
    fn correlation_table_has_a_line_per_coin() {
        let matrix = CorrelationMatrix {
            coins: vec!["bitcoin".to_string(), "ethereum".to_string()],
            values: vec![vec![1.0, 0.5], vec![0.5, 1.0]],
        };
        let rendered = render_correlation(&matrix);
        assert_eq!(rendered.lines().count(), 3);
        assert!(rendered.contains("0.500"));
    }
}
