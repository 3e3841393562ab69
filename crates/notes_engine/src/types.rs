use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use notes_core::LedgerSnapshot;
use serde::Serialize;

use crate::export::{ExportError, ExportSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversionFailure {
    /// The converter binary could not be found.
    ToolUnavailable,
    /// Non-zero exit, abnormal termination, or timeout.
    ConversionFailed,
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionFailure::ToolUnavailable => write!(f, "converter unavailable"),
            ConversionFailure::ConversionFailed => write!(f, "conversion failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ConversionError {
    pub kind: ConversionFailure,
    pub message: String,
}

impl ConversionError {
    pub(crate) fn new(kind: ConversionFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Errors that stop a run. Everything else is logged or lands in the ledger.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("root directory {path:?} is unusable: {reason}")]
    Root { path: PathBuf, reason: String },
    #[error("failed to export ledger: {0}")]
    Export(#[from] ExportError),
    #[error("conversion phase panicked: {0}")]
    Panicked(String),
}

/// What happened to the archive bundles found at run start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractReport {
    /// Bundles expanded during this run; only these are removed afterwards.
    pub extracted: Vec<PathBuf>,
    pub already_extracted: Vec<PathBuf>,
    pub corrupt: Vec<PathBuf>,
    pub excluded: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub renamed: usize,
    pub conflicts: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ArchiveOutcome {
    /// No degenerate outputs were found.
    Nothing,
    /// An archive of the same name already existed; nothing was moved.
    SkippedExisting { archive: PathBuf },
    /// Degenerate outputs were found but none could be moved; no archive was
    /// written and the directories stay in place.
    NotMoved { move_failures: usize },
    Archived {
        archive: PathBuf,
        directories: usize,
        move_failures: usize,
    },
    Disabled,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub bundles_removed: usize,
    pub archive: ArchiveOutcome,
}

/// Outcome of a full pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub converted: usize,
    pub failed: usize,
    /// Documents whose destination already existed before dispatch.
    pub skipped_existing: usize,
    /// Documents left alone because their directory could not be renamed.
    pub skipped_conflicts: usize,
    /// Documents whose destination was already claimed by another document.
    pub skipped_duplicates: usize,
    pub extract: ExtractReport,
    pub rename: RenameReport,
    pub exported: ExportSummary,
    pub reconcile: ReconcileReport,
    #[serde(skip)]
    pub ledger: LedgerSnapshot,
    pub elapsed: Duration,
}
