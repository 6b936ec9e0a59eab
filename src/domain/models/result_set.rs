//! Accumulated, deduplicated transcript.
//!
//! Invariants:
//! - at most one record per identity key
//! - content length per identity never decreases
//! - after any change, records are sorted by timestamp (stable, so equal
//!   timestamps keep their prior relative order)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::record::{IdentityKey, RawRecord, Record};

/// Outcome of merging one raw batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Identities seen for the first time
    pub new: usize,
    /// Existing identities whose content grew
    pub updated: usize,
    /// Malformed raw records discarded
    pub dropped: usize,
    /// Valid identities observed in the batch, in first-occurrence order
    #[serde(skip)]
    pub observed: Vec<IdentityKey>,
}

impl MergeReport {
    /// Whether the merge changed the result set.
    pub fn changed(&self) -> bool {
        self.new + self.updated > 0
    }
}

/// Collapse a raw batch to one validated record per identity.
///
/// The longest content wins; on equal length the later observation wins.
/// Returned records keep the order in which each identity first appeared.
/// The second value is the number of malformed records dropped.
pub fn collapse_batch(batch: Vec<RawRecord>) -> (Vec<Record>, usize) {
    let mut collapsed: Vec<Record> = Vec::with_capacity(batch.len());
    let mut positions: HashMap<IdentityKey, usize> = HashMap::with_capacity(batch.len());
    let mut dropped = 0;

    for raw in batch {
        let Some(record) = Record::from_raw(raw) else {
            dropped += 1;
            continue;
        };

        match positions.get(&record.identity()) {
            Some(&pos) => {
                if record.content_len() >= collapsed[pos].content_len() {
                    collapsed[pos] = record;
                }
            }
            None => {
                positions.insert(record.identity(), collapsed.len());
                collapsed.push(record);
            }
        }
    }

    (collapsed, dropped)
}

/// Time-ordered transcript keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: Vec<Record>,
    index: HashMap<IdentityKey, usize>,
}

impl ResultSet {
    /// Create an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a raw batch into the set and report what changed.
    pub fn merge(&mut self, batch: Vec<RawRecord>) -> MergeReport {
        let (collapsed, dropped) = collapse_batch(batch);
        let mut report = MergeReport {
            dropped,
            observed: collapsed.iter().map(Record::identity).collect(),
            ..MergeReport::default()
        };

        for record in collapsed {
            let key = record.identity();
            match self.index.get(&key) {
                Some(&pos) => {
                    if self.records[pos].should_replace(&record) {
                        self.records[pos] = record;
                        report.updated += 1;
                    }
                }
                None => {
                    self.index.insert(key, self.records.len());
                    self.records.push(record);
                    report.new += 1;
                }
            }
        }

        if report.changed() {
            self.records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            self.reindex();
        }

        report
    }

    /// Look up the current record for an identity.
    pub fn get(&self, key: &IdentityKey) -> Option<&Record> {
        self.index.get(key).map(|&pos| &self.records[pos])
    }

    /// Records in timestamp order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of distinct identities held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True until the first valid record is merged.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the set, keeping the order.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    fn reindex(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(pos, record)| (record.identity(), pos))
            .collect();
    }
}
