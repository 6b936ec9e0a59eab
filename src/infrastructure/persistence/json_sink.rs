use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::domain::errors::{HarvestError, HarvestResult};
use crate::domain::models::Record;
use crate::domain::ports::TranscriptSink;

/// Writes the whole transcript as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Sink that rewrites the transcript at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Transcript location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptSink for JsonFileSink {
    fn write(&mut self, records: &[Record]) -> HarvestResult<()> {
        let mut data = serde_json::to_vec_pretty(records)
            .map_err(|e| persistence_error(&self.path, e))?;
        data.push(b'\n');
        write_atomic(&self.path, &data)
    }
}

/// Atomic write: write to a temp file in the same directory, then rename.
///
/// Readers see either the previous file or the new one, never a prefix.
pub fn write_atomic(path: &Path, data: &[u8]) -> HarvestResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| persistence_error(path, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| persistence_error(path, e))?;
    tmp.write_all(data).map_err(|e| persistence_error(path, e))?;
    tmp.flush().map_err(|e| persistence_error(path, e))?;
    tmp.persist(path).map_err(|e| persistence_error(path, e.error))?;
    Ok(())
}

/// Read a persisted transcript. Accepts `"timestamp"` in place of `"time"`.
pub fn load_transcript(path: &Path) -> HarvestResult<Vec<Record>> {
    let data = fs::read(path).map_err(|e| persistence_error(path, e))?;
    serde_json::from_slice(&data).map_err(|e| persistence_error(path, e))
}

pub(crate) fn persistence_error(path: &Path, err: impl std::fmt::Display) -> HarvestError {
    HarvestError::Persistence {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
