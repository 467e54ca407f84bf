//! NetworkState Registry
//!
//! A single-owner registry tracking two independent collections: territories
//! keyed by a caller-supplied identifier, and community members keyed by
//! identity. Minting territories is reserved to the owner fixed at
//! construction; joining the community is open to any caller. Both are
//! one-shot per key and never overwrite.

pub mod dispatch;
pub mod errors;
pub mod registry;

pub use errors::*;
pub use registry::NetworkStateRegistry;
