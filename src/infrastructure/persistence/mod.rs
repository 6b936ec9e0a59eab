//! File persistence for harvested transcripts
//!
//! - JSON snapshot sink, rewritten atomically on every accepted change
//! - CSV projection of a persisted transcript

pub mod csv_export;
pub mod json_sink;

pub use csv_export::{export_json_to_csv, write_csv};
pub use json_sink::{load_transcript, write_atomic, JsonFileSink};
