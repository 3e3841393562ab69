use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use notes_logging::{notes_debug, notes_error, notes_info, notes_warn};
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::discover::discover_files;
use crate::settings::PipelineSettings;
use crate::{ArchiveOutcome, ReconcileReport};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("cannot move {from:?} into {holding:?}: {source}")]
    ArchiveMoveFailed {
        from: PathBuf,
        holding: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write archive {path:?}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Runs both end-of-run steps. Failures are logged, never propagated.
pub fn reconcile(root: &Path, settings: &PipelineSettings, extracted: &[PathBuf]) -> ReconcileReport {
    let bundles_removed = if settings.remove_bundles {
        remove_extracted_bundles(extracted)
    } else {
        0
    };
    let archive = if settings.archive_empty {
        archive_empty_outputs(root, settings).unwrap_or_else(|err| {
            notes_error!("Archiving empty outputs failed: {}", err);
            ArchiveOutcome::Failed {
                reason: err.to_string(),
            }
        })
    } else {
        ArchiveOutcome::Disabled
    };
    ReconcileReport {
        bundles_removed,
        archive,
    }
}

/// Deletes the bundles that were expanded during this run. Returns how many
/// were removed.
pub fn remove_extracted_bundles(bundles: &[PathBuf]) -> usize {
    bundles
        .iter()
        .filter(|bundle| match fs::remove_file(bundle) {
            Ok(()) => {
                notes_info!("Removed {:?}", bundle);
                true
            }
            Err(err) => {
                notes_warn!("Could not remove {:?}: {}", bundle, err);
                false
            }
        })
        .count()
}

/// Moves every directory holding an empty markdown file into the holding area,
/// compresses the holding area into one archive at the root, and deletes the
/// holding area.
///
/// An existing archive of the same name is never overwritten; the step is
/// skipped instead.
pub fn archive_empty_outputs(
    root: &Path,
    settings: &PipelineSettings,
) -> Result<ArchiveOutcome, ReconcileError> {
    archive_with_mover(root, settings, move_into)
}

fn archive_with_mover<M>(
    root: &Path,
    settings: &PipelineSettings,
    mut mover: M,
) -> Result<ArchiveOutcome, ReconcileError>
where
    M: FnMut(&Path, &Path) -> Result<PathBuf, ReconcileError>,
{
    let archive_path = root.join(settings.archive_file_name());
    if archive_path.exists() {
        notes_warn!(
            "Archive {:?} already exists, leaving empty outputs in place",
            archive_path
        );
        return Ok(ArchiveOutcome::SkippedExisting {
            archive: archive_path,
        });
    }

    let holding = root.join(&settings.holding_dir_name);
    let dirs = empty_output_dirs(root, &holding, settings);
    if dirs.is_empty() && !holding.exists() {
        return Ok(ArchiveOutcome::Nothing);
    }

    fs::create_dir_all(&holding)?;
    let mut moved = 0;
    let mut move_failures = 0;
    for dir in &dirs {
        match mover(dir, &holding) {
            Ok(target) => {
                notes_info!("Moved {:?} to {:?}", dir, target);
                moved += 1;
            }
            Err(err) => {
                notes_error!("{}", err);
                move_failures += 1;
            }
        }
    }

    if fs::read_dir(&holding)?.next().is_none() {
        fs::remove_dir(&holding)?;
        if move_failures > 0 {
            return Ok(ArchiveOutcome::NotMoved { move_failures });
        }
        return Ok(ArchiveOutcome::Nothing);
    }

    write_archive(root, &holding, &archive_path)?;
    fs::remove_dir_all(&holding)?;
    notes_info!("Archived {} empty note directories into {:?}", moved, archive_path);

    Ok(ArchiveOutcome::Archived {
        archive: archive_path,
        directories: moved,
        move_failures,
    })
}

/// Outermost directories below `root` that contain a degenerate markdown file.
fn empty_output_dirs(root: &Path, holding: &Path, settings: &PipelineSettings) -> Vec<PathBuf> {
    let candidates: BTreeSet<PathBuf> = discover_files(root, &settings.output_extension)
        .into_iter()
        .filter(|path| !path.starts_with(holding))
        .filter(|path| match fs::metadata(path) {
            Ok(meta) => meta.len() <= settings.empty_threshold_bytes,
            Err(_) => false,
        })
        .filter_map(|path| {
            let dir = path.parent()?.to_path_buf();
            if dir == root {
                notes_warn!("Empty output {:?} sits at the root, leaving it in place", path);
                return None;
            }
            notes_debug!("Empty output {:?}", path);
            Some(dir)
        })
        .collect();

    let mut outermost: Vec<PathBuf> = Vec::new();
    for dir in candidates {
        if !outermost.iter().any(|kept| dir.starts_with(kept)) {
            outermost.push(dir);
        }
    }
    outermost
}

fn move_into(dir: &Path, holding: &Path) -> Result<PathBuf, ReconcileError> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "notes".to_string());
    let mut target = holding.join(&name);
    let mut suffix = 2;
    while target.exists() {
        target = holding.join(format!("{name}-{suffix}"));
        suffix += 1;
    }
    fs::rename(dir, &target).map_err(|source| ReconcileError::ArchiveMoveFailed {
        from: dir.to_path_buf(),
        holding: holding.to_path_buf(),
        source,
    })?;
    Ok(target)
}

/// Zips `holding` (entries prefixed with its own name) into `archive_path`
/// without clobbering an existing file.
fn write_archive(root: &Path, holding: &Path, archive_path: &Path) -> Result<(), ReconcileError> {
    let zip_err = |source| ReconcileError::Archive {
        path: archive_path.to_path_buf(),
        source,
    };
    let base = holding.parent().unwrap_or(root);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut tmp = NamedTempFile::new_in(root)?;
    {
        let mut zip = ZipWriter::new(tmp.as_file_mut());
        for entry in WalkDir::new(holding).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(base)
                .unwrap_or(entry.path());
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if entry.file_type().is_dir() {
                zip.add_directory(name, options).map_err(zip_err)?;
            } else if entry.file_type().is_file() {
                zip.start_file(name, options).map_err(zip_err)?;
                let mut file = File::open(entry.path())?;
                io::copy(&mut file, &mut zip)?;
            }
        }
        zip.finish().map_err(zip_err)?;
    }
    tmp.persist_noclobber(archive_path)
        .map_err(|e| ReconcileError::Io(e.error))?;
    Ok(())
}
