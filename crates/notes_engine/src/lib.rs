//! Notes engine: filesystem and subprocess side of a conversion run.
mod convert;
mod discover;
mod engine;
mod export;
mod extract;
mod persist;
mod reconcile;
mod rename;
mod settings;
mod types;

pub use convert::{CommandConverter, Converter};
pub use discover::discover_files;
pub use engine::{plan_jobs, JobPlan, Pipeline};
pub use export::{export_ledger, ExportError, ExportOptions, ExportSummary, NOTE_COLUMN};
pub use extract::{
    existing_extraction, extract_bundle, extract_bundles, extraction_target, BundleOutcome,
    ExclusionSet, ExtractError,
};
pub use persist::{ensure_writable_dir, AtomicFileWriter, PersistError};
pub use reconcile::{archive_empty_outputs, reconcile, remove_extracted_bundles, ReconcileError};
pub use rename::{apply_renames, RenameError};
pub use settings::{ConverterSettings, PipelineSettings, INPUT_PLACEHOLDER};
pub use types::{
    ArchiveOutcome, ConversionError, ConversionFailure, ExtractReport, PipelineError,
    ReconcileReport, RenameReport, RunReport,
};
