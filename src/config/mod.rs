//! Configuration module for the coin-grid pipeline.

pub mod coingecko;
pub mod pipeline;
pub mod persistence;

mod debug; // Private: files use crate::config::DEBUG_FLAGS rather than crate::config::debug
pub use debug::DEBUG_FLAGS;

// Re-export commonly used items
pub use coingecko::{COINGECKO, ChartRequest};
pub use persistence::{PERSISTENCE, raw_chart_cache_filename};
pub use pipeline::{PIPELINE, PipelineSettings};
