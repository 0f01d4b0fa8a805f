// Retrieval, persistence and caching collaborators
pub mod market_chart;
pub mod memo;
pub mod store;

// Re-export commonly used types
pub use market_chart::{ChartCollection, MarketChart, RawPoint};
pub use memo::{Memoized, MemoizedStore};
pub use store::{DerivedStore, SqliteStore};
