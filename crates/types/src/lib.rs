//! Shared types for the NetworkState registry.
//!
//! Identities, prices, the territory and member records, the deployment
//! record, the event log entries and the signed call envelope used by
//! callers to authenticate mutations.

pub mod address;
pub mod amount;
pub mod call;
pub mod deployment;
pub mod event;
pub mod member;
pub mod territory;

pub use address::*;
pub use amount::*;
pub use call::*;
pub use deployment::*;
pub use event::*;
pub use member::*;
pub use territory::*;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current UNIX time in seconds, or 0 if the clock is before the epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
