//! Reconciler - sole owner of the result set and its backing sink.

use tracing::{debug, trace};

use crate::domain::errors::HarvestResult;
use crate::domain::models::{MergeReport, RawRecord, ResultSet};
use crate::domain::ports::TranscriptSink;

/// Merges raw batches into the accumulated transcript and persists every
/// accepted change.
pub struct Reconciler<S: TranscriptSink> {
    result: ResultSet,
    sink: S,
    writes: u32,
}

impl<S: TranscriptSink> Reconciler<S> {
    /// Start with an empty result set.
    pub fn new(sink: S) -> Self {
        Self {
            result: ResultSet::new(),
            sink,
            writes: 0,
        }
    }

    /// Merge one raw batch.
    ///
    /// The sink is written exactly when the merge inserted or improved at
    /// least one record. A batch with no valid records returns an empty
    /// report and writes nothing.
    pub fn merge(&mut self, batch: Vec<RawRecord>) -> HarvestResult<MergeReport> {
        let batch_len = batch.len();
        let report = self.result.merge(batch);

        if report.dropped > 0 {
            debug!(
                dropped = report.dropped,
                batch_len, "dropped malformed records"
            );
        }

        if report.changed() {
            self.sink.write(self.result.records())?;
            self.writes += 1;
            debug!(
                new = report.new,
                updated = report.updated,
                total = self.result.len(),
                writes = self.writes,
                "persisted transcript"
            );
        } else {
            trace!(batch_len, "batch brought nothing new");
        }

        Ok(report)
    }

    /// Current result set.
    pub fn result(&self) -> &ResultSet {
        &self.result
    }

    /// Number of sink writes performed so far.
    pub fn writes(&self) -> u32 {
        self.writes
    }

    /// Hand back the result set and the sink.
    pub fn into_parts(self) -> (ResultSet, S) {
        (self.result, self.sink)
    }
}
