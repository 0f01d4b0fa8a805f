// Cross-coin aggregation and the queries the presentation layer runs against it
pub mod aggregator;
pub mod correlation;
pub mod queries;

// Re-export commonly used types
pub use aggregator::{CombinedDataset, combine_coin_frames};
pub use correlation::{CorrelationMatrix, correlation_matrix};
pub use queries::{HeadlineMetrics, coin_view, latest_row, recent_rows, resolve_date_window};
