//! Infrastructure layer module
//!
//! Adapters and external integrations:
//! - Configuration management (figment)
//! - Logging (tracing-subscriber, tracing-appender)
//! - Transcript persistence (JSON snapshots, CSV export)
//! - Snapshot sources (helper process, virtual list)
//! - Retry policy for source calls
//!
//! Implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod persistence;
pub mod retry;
pub mod sources;
