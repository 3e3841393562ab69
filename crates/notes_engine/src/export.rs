use std::path::{Path, PathBuf};

use notes_core::{LedgerEntry, LedgerSnapshot};
use serde::Serialize;

use crate::persist::{AtomicFileWriter, PersistError};

/// Header of the single column in both tables.
pub const NOTE_COLUMN: &str = "note";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub success_filename: String,
    pub failure_filename: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            success_filename: "win_list.csv".to_string(),
            failure_filename: "fail_list.csv".to_string(),
        }
    }
}

/// Paths written by [`export_ledger`]; `None` where the table was empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub successes_path: Option<PathBuf>,
    pub failures_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Writes the success and failure tables into `output_dir`.
///
/// An empty table produces no file at all.
pub fn export_ledger(
    output_dir: &Path,
    snapshot: &LedgerSnapshot,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let successes_path = write_table(&writer, &options.success_filename, &snapshot.successes)?;
    let failures_path = write_table(&writer, &options.failure_filename, &snapshot.failures)?;
    Ok(ExportSummary {
        successes_path,
        failures_path,
    })
}

fn write_table(
    writer: &AtomicFileWriter,
    filename: &str,
    entries: &[LedgerEntry],
) -> Result<Option<PathBuf>, ExportError> {
    if entries.is_empty() {
        return Ok(None);
    }
    let content = render_table(entries)?;
    Ok(Some(writer.write(filename, &content)?))
}

fn render_table(entries: &[LedgerEntry]) -> Result<String, ExportError> {
    let mut ordered: Vec<&LedgerEntry> = entries.iter().collect();
    ordered.sort_by_key(|e| e.seq);

    let mut table = csv::Writer::from_writer(Vec::new());
    table.write_record([NOTE_COLUMN])?;
    for entry in ordered {
        table.write_record([&*entry.source.to_string_lossy()])?;
    }
    let bytes = table.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
