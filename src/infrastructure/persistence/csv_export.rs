use std::path::Path;

use csv::WriterBuilder;

use super::json_sink::{load_transcript, persistence_error, write_atomic};
use crate::domain::errors::HarvestResult;
use crate::domain::models::Record;

const HEADER: [&str; 3] = ["speaker", "time", "content"];

/// Write records as CSV with a `speaker,time,content` header.
pub fn write_csv(path: &Path, records: &[Record]) -> HarvestResult<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(HEADER)
        .map_err(|e| persistence_error(path, e))?;
    for record in records {
        writer
            .write_record([&record.speaker, &record.timestamp, &record.content])
            .map_err(|e| persistence_error(path, e))?;
    }

    let data = writer
        .into_inner()
        .map_err(|e| persistence_error(path, e))?;
    write_atomic(path, &data)
}

/// Project a persisted JSON transcript to CSV, preserving order.
///
/// Returns the number of rows written.
pub fn export_json_to_csv(input: &Path, output: &Path) -> HarvestResult<usize> {
    let records = load_transcript(input)?;
    write_csv(output, &records)?;
    Ok(records.len())
}
