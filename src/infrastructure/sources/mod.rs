//! Snapshot source adapters
//!
//! - `ProcessSource`: an external helper process driving the real view
//! - `VirtualListSource`: an in-memory virtualized list for dry runs and tests

pub mod process;
pub mod virtual_list;

pub use process::ProcessSource;
pub use virtual_list::VirtualListSource;
