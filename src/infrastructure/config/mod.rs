//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - Programmatic defaults
//! - Project YAML files under `.harvest/`
//! - `HARVEST_*` environment overrides
//! - Validation before anything runs

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
