use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use futures_util::FutureExt;
use notes_core::{dedupe_destinations, ConversionJob, Ledger, LedgerSnapshot, RenamePlan};
use notes_logging::{notes_debug, notes_error, notes_info, notes_warn, ScopedTimer};

use crate::convert::{CommandConverter, Converter};
use crate::discover::discover_files;
use crate::export::{export_ledger, ExportOptions, ExportSummary};
use crate::extract::extract_bundles;
use crate::persist::{ensure_writable_dir, AtomicFileWriter, PersistError};
use crate::reconcile::reconcile;
use crate::rename::apply_renames;
use crate::settings::PipelineSettings;
use crate::{PipelineError, RenameReport, RunReport};

/// Drives one full run: extract, discover, rename, convert, export, reconcile.
pub struct Pipeline {
    settings: PipelineSettings,
    converter: Arc<dyn Converter>,
}

/// Jobs ready for dispatch plus what was set aside while planning.
#[derive(Debug, Default)]
pub struct JobPlan {
    pub jobs: Vec<ConversionJob>,
    pub skipped_existing: usize,
    pub skipped_conflicts: usize,
    pub skipped_duplicates: usize,
    pub rename: RenameReport,
}

#[derive(Debug)]
struct ConvertPhase {
    plan: JobPlan,
    ledger: LedgerSnapshot,
    exported: ExportSummary,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings, converter: Arc<dyn Converter>) -> Self {
        Self {
            settings,
            converter,
        }
    }

    /// Pipeline using the external converter described by the settings.
    pub fn with_command_converter(settings: PipelineSettings) -> Self {
        let converter = Arc::new(CommandConverter::new(settings.converter.clone()));
        Self::new(settings, converter)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs the pipeline under the configured root.
    ///
    /// Reconciliation always runs once the root is known to be usable, even
    /// when the conversion phase fails or panics.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let timer = ScopedTimer::new("Pipeline run");
        let root = usable_root(&self.settings.root)?;

        let mut exclusions = self.settings.exclude_patterns.clone();
        exclusions.push(glob::Pattern::escape(&self.settings.archive_file_name()));
        let extract = extract_bundles(&root, &self.settings.bundle_extension, &exclusions);

        let phase = AssertUnwindSafe(self.convert_tree(&root))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(PipelineError::Panicked(panic_message(panic))));

        let reconcile = reconcile(&root, &self.settings, &extract.extracted);

        let ConvertPhase {
            plan,
            ledger,
            exported,
        } = phase?;
        notes_info!(
            "Converted {} notes, failed to convert {} notes",
            ledger.successes.len(),
            ledger.failures.len()
        );

        Ok(RunReport {
            converted: ledger.successes.len(),
            failed: ledger.failures.len(),
            skipped_existing: plan.skipped_existing,
            skipped_conflicts: plan.skipped_conflicts,
            skipped_duplicates: plan.skipped_duplicates,
            extract,
            rename: plan.rename,
            exported,
            reconcile,
            ledger,
            elapsed: timer.elapsed(),
        })
    }

    async fn convert_tree(&self, root: &Path) -> Result<ConvertPhase, PipelineError> {
        let mut plan = plan_jobs(root, &self.settings);
        let ledger = Ledger::new();
        let jobs = std::mem::take(&mut plan.jobs);
        notes_info!("Dispatching {} conversions", jobs.len());
        self.dispatch(jobs, &ledger).await;

        let snapshot = ledger.snapshot();
        let options = ExportOptions {
            success_filename: self.settings.success_table.clone(),
            failure_filename: self.settings.failure_table.clone(),
        };
        let exported = export_ledger(root, &snapshot, &options)?;
        Ok(ConvertPhase {
            plan,
            ledger: snapshot,
            exported,
        })
    }

    /// Converts every job with bounded concurrency and waits for all of them.
    ///
    /// Jobs start in the given order; completions arrive in any order.
    pub async fn dispatch(&self, jobs: Vec<ConversionJob>, ledger: &Ledger) {
        let converter = self.converter.as_ref();
        stream::iter(jobs)
            .map(|job| convert_one(converter, job, ledger))
            .buffer_unordered(self.settings.concurrency())
            .collect::<()>()
            .await;
    }
}

/// Discovers documents, applies the rename pre-pass, and keeps only jobs whose
/// destination is free.
pub fn plan_jobs(root: &Path, settings: &PipelineSettings) -> JobPlan {
    let sources = discover_files(root, &settings.document_extension);
    let rename_plan = RenamePlan::build(root, sources.iter().map(PathBuf::as_path));
    let (resolver, rename) = apply_renames(root, &rename_plan);

    let mut plan = JobPlan {
        rename,
        ..JobPlan::default()
    };
    let mut candidates = Vec::with_capacity(sources.len());
    for original in &sources {
        if resolver.is_conflicted(original) {
            plan.skipped_conflicts += 1;
            continue;
        }
        let original_dir_name = original
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let job = ConversionJob::new(
            resolver.resolve(original),
            original_dir_name,
            &settings.output_extension,
        );
        if job.destination.exists() {
            notes_info!(
                "Markdown file {:?} already exists, skipping",
                job.destination
            );
            plan.skipped_existing += 1;
            continue;
        }
        candidates.push(job);
    }

    let (jobs, duplicates) = dedupe_destinations(candidates);
    for job in &duplicates {
        notes_warn!(
            "Skipping {:?}, its destination {:?} is claimed by another document",
            job.source,
            job.destination
        );
    }
    plan.skipped_duplicates = duplicates.len();
    plan.jobs = jobs;
    plan
}

async fn convert_one(converter: &dyn Converter, job: ConversionJob, ledger: &Ledger) {
    notes_debug!("Converting {:?}", job.source);
    let markdown = match converter.convert(&job.source).await {
        Ok(markdown) => markdown,
        Err(err) => {
            notes_error!("Failed to convert {:?}: {}", job.source, err);
            ledger.record_failure(&job.source);
            return;
        }
    };

    match write_destination(&job.destination, &markdown) {
        Ok(()) => {
            let entry = ledger.record_success(&job.source);
            notes_info!("Wrote markdown #{} to {:?}", entry.seq, job.destination);
        }
        Err(PersistError::AlreadyExists(path)) => {
            notes_info!("Markdown file {:?} already exists, skipping", path);
        }
        Err(err) => {
            notes_error!("Failed to write {:?}: {}", job.destination, err);
            ledger.record_failure(&job.source);
        }
    }
}

fn write_destination(destination: &Path, markdown: &str) -> Result<(), PersistError> {
    let (writer, filename) = AtomicFileWriter::for_path(destination)
        .ok_or_else(|| PersistError::OutputDir(format!("{destination:?} has no parent")))?;
    writer.write_new(&filename, markdown)?;
    Ok(())
}

fn usable_root(root: &Path) -> Result<PathBuf, PipelineError> {
    let unusable = |reason: String| PipelineError::Root {
        path: root.to_path_buf(),
        reason,
    };
    ensure_writable_dir(root).map_err(|e| unusable(e.to_string()))?;
    root.canonicalize().map_err(|e| unusable(e.to_string()))
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
