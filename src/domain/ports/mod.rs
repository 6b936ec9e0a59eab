//! Port trait definitions (Hexagonal Architecture)
//!
//! - SnapshotSource: the rendering view that supplies visible records
//! - TranscriptSink: durable storage for the accumulated transcript
//!
//! The controller depends only on these traits, never on a concrete
//! browser driver or file format.

pub mod snapshot_source;
pub mod transcript_sink;

pub use snapshot_source::SnapshotSource;
pub use transcript_sink::TranscriptSink;
