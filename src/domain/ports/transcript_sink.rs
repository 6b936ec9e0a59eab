//! Transcript sink port - durable storage for the result set.

use crate::domain::errors::HarvestResult;
use crate::domain::models::Record;

/// Destination for whole-snapshot rewrites of the transcript.
///
/// Implementations must never expose a partially written snapshot to readers,
/// and writing identical content twice must be harmless.
pub trait TranscriptSink: Send {
    /// Replace the stored transcript with `records`.
    fn write(&mut self, records: &[Record]) -> HarvestResult<()>;
}
