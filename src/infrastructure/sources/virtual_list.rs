//! In-memory virtualized list
//!
//! Only `window` rows exist at a time, starting at the row under the scroll
//! offset. Rows along the bottom edge are still rendering and show a prefix
//! of their content, except once the view is scrolled to the end.

use async_trait::async_trait;

use crate::domain::errors::SourceError;
use crate::domain::models::{RawRecord, Record};
use crate::domain::ports::SnapshotSource;

/// Rows at the bottom edge that render partially.
const DEFAULT_PARTIAL_ROWS: usize = 1;

#[derive(Debug, Clone)]
pub struct VirtualListSource {
    rows: Vec<Record>,
    window: usize,
    row_height: u32,
    partial_rows: usize,
    offset_px: u64,
}

impl VirtualListSource {
    /// `window` and `row_height` are clamped to at least 1.
    pub fn new(rows: Vec<Record>, window: usize, row_height: u32) -> Self {
        Self {
            rows,
            window: window.max(1),
            row_height: row_height.max(1),
            partial_rows: DEFAULT_PARTIAL_ROWS,
            offset_px: 0,
        }
    }

    #[must_use]
    pub fn with_partial_rows(mut self, partial_rows: usize) -> Self {
        self.partial_rows = partial_rows;
        self
    }

    fn max_offset_px(&self) -> u64 {
        let scrollable_rows = self.rows.len().saturating_sub(self.window) as u64;
        scrollable_rows * u64::from(self.row_height)
    }

    /// Index of the first rendered row.
    pub fn first_visible(&self) -> usize {
        usize::try_from(self.offset_px / u64::from(self.row_height)).unwrap_or(usize::MAX)
    }

    pub fn at_end(&self) -> bool {
        self.offset_px >= self.max_offset_px()
    }

    fn render(&self, row: &Record, partial: bool) -> RawRecord {
        let content = if partial {
            let chars = row.content.chars().count();
            row.content.chars().take(chars.div_ceil(2)).collect()
        } else {
            row.content.clone()
        };
        RawRecord::new(row.speaker.clone(), row.timestamp.clone(), content)
    }
}

#[async_trait]
impl SnapshotSource for VirtualListSource {
    fn name(&self) -> &str {
        "virtual-list"
    }

    async fn sample(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        let first = self.first_visible().min(self.rows.len());
        let last = first.saturating_add(self.window).min(self.rows.len());
        let partial_from = if self.at_end() {
            last
        } else {
            last.saturating_sub(self.partial_rows)
        };

        Ok(self.rows[first..last]
            .iter()
            .enumerate()
            .map(|(i, row)| self.render(row, first + i >= partial_from))
            .collect())
    }

    async fn advance(&mut self, step: u32, repetitions: u32) -> Result<(), SourceError> {
        let distance = u64::from(step) * u64::from(repetitions);
        self.offset_px = self
            .offset_px
            .saturating_add(distance)
            .min(self.max_offset_px());
        Ok(())
    }
}
