//! Freshness policy for astronomical queries.
//!
//! A location fix plus ephemeris computation is slow and may wake the GPS, so
//! it is only repeated when the last successful result is older than the
//! staleness threshold. The decision is made on resume, not on a timer.
//!
//! - [`FreshnessGate`] - the pure decision
//! - [`FreshnessStore`] - where the last success timestamp lives

mod gate;
mod store;

pub use gate::{FreshnessGate, DEFAULT_STALENESS_THRESHOLD};
pub use store::{
    default_state_path, FileFreshnessStore, FreshnessRecord, FreshnessStore,
    MemoryFreshnessStore,
};
