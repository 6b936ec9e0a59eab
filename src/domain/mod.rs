//! Domain layer for transcript harvesting
//!
//! Records, the accumulated result set, run configuration and outcomes,
//! plus the port traits infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{HarvestError, HarvestResult, SourceError};
