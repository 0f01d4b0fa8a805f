//! Debugging feature flags.
//!
//! Toggle individual diagnostics here; keep them `false` by default so release
//! builds remain quiet.

pub struct DebugFlags {
    /// Emit detailed cache read/write logs.
    pub print_serde: bool,
    /// Emit per-coin merge/grid statistics (duplicates, off-grid drops, synthesized ticks).
    pub print_grid_stats: bool,
    /// Emit memo hit/refresh diagnostics.
    pub print_memo_events: bool,
}

pub const DEBUG_FLAGS: DebugFlags = DebugFlags {
    print_serde: false,
    print_grid_stats: false,
    print_memo_events: false,
};
