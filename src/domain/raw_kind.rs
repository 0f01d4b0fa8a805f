use serde::{Deserialize, Serialize};

/// The three independently sampled raw sequences of a market chart.
/// The serialized names match the keys of the market-chart JSON document.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    strum_macros::EnumIter,
    strum_macros::AsRefStr,
    strum_macros::Display,
)]
pub enum RawKind {
    #[strum(serialize = "prices")]
    Price,
    #[strum(serialize = "market_caps")]
    MarketCap,
    #[strum(serialize = "total_volumes")]
    TotalVolume,
}
