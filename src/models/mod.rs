// Row types flowing between pipeline stages.
// Each stage produces a new Vec; no stage mutates a previous stage's output.

pub mod rows;

pub use rows::{DerivedRow, GridRow, MergedRow, StoredRow};
