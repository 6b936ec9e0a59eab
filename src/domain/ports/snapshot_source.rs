//! Snapshot source port - interface to the rendering view.

use async_trait::async_trait;

use crate::domain::errors::SourceError;
use crate::domain::models::RawRecord;

/// A single shared, stateful view of a virtualized list.
///
/// Methods take `&mut self`: the view cannot be queried concurrently without
/// risking inconsistent reads, so every interaction is serialized through one
/// exclusive borrow.
#[async_trait]
pub trait SnapshotSource: Send {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Return the records currently visible, in view order.
    ///
    /// Records may be partial, duplicated or malformed; the reconciler
    /// filters them.
    async fn sample(&mut self) -> Result<Vec<RawRecord>, SourceError>;

    /// Reveal more content by moving `step` units, `repetitions` times.
    async fn advance(&mut self, step: u32, repetitions: u32) -> Result<(), SourceError>;
}
