pub mod core;

pub use core::{CoinOutcome, PipelineEngine, RunSummary, transform_collection};
