// Domain types and value objects
pub mod coin_interval;
pub mod data_error;
pub mod raw_kind;

// Re-export commonly used types
pub use coin_interval::CoinInterval;
pub use data_error::MissingData;
pub use raw_kind::RawKind;
