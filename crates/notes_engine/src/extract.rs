use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use notes_core::sanitize_dir_name;
use notes_logging::{notes_debug, notes_error, notes_info, notes_warn};
use thiserror::Error;
use zip::ZipArchive;

use crate::discover::discover_files;
use crate::ExtractReport;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("archive {path:?} is corrupt: {message}")]
    ArchiveCorrupt { path: PathBuf, message: String },
    #[error("io error while extracting {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleOutcome {
    Extracted { target: PathBuf },
    AlreadyExtracted { target: PathBuf },
}

/// Compiled exclusion patterns for bundle discovery.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
}

impl ExclusionSet {
    /// Invalid patterns are logged and ignored.
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|raw| match Pattern::new(raw) {
                Ok(pattern) => Some(pattern),
                Err(err) => {
                    notes_warn!("Ignoring invalid exclude pattern {:?}: {}", raw, err);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Matches against the file name and the root-relative path.
    pub fn is_excluded(&self, root: &Path, path: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let name = path.file_name().map(Path::new);
        self.patterns.iter().any(|pattern| {
            pattern.matches_path(relative) || name.is_some_and(|n| pattern.matches_path(n))
        })
    }
}

/// Sibling directory a bundle expands into: the bundle path without its
/// extension.
pub fn extraction_target(bundle: &Path) -> PathBuf {
    bundle.with_extension("")
}

/// Directory that already holds this bundle's contents, if any: the raw
/// extraction target, or the name it is given by the rename pre-pass of an
/// earlier run.
pub fn existing_extraction(bundle: &Path) -> Option<PathBuf> {
    let target = extraction_target(bundle);
    if target.exists() {
        return Some(target);
    }
    let stem = target.file_name()?.to_string_lossy().into_owned();
    let sanitized = sanitize_dir_name(&stem);
    if sanitized.is_empty() || sanitized == stem {
        return None;
    }
    let renamed = target.with_file_name(sanitized);
    renamed.is_dir().then_some(renamed)
}

/// Finds every bundle under `root` and expands the ones not excluded and not
/// already extracted. A bundle that fails is logged and skipped.
pub fn extract_bundles(root: &Path, extension: &str, exclude_patterns: &[String]) -> ExtractReport {
    let exclusions = ExclusionSet::new(exclude_patterns);
    let mut report = ExtractReport::default();

    for bundle in discover_files(root, extension) {
        if exclusions.is_excluded(root, &bundle) {
            notes_debug!("Excluded bundle {:?}", bundle);
            report.excluded += 1;
            continue;
        }
        match extract_bundle(&bundle) {
            Ok(BundleOutcome::Extracted { target }) => {
                notes_info!("Unzipped {:?} into {:?}", bundle, target);
                report.extracted.push(bundle);
            }
            Ok(BundleOutcome::AlreadyExtracted { target }) => {
                notes_info!("Skipping {:?}, already extracted to {:?}", bundle, target);
                report.already_extracted.push(bundle);
            }
            Err(err) => {
                notes_error!("Skipping {:?}: {}", bundle, err);
                report.corrupt.push(bundle);
            }
        }
    }
    report
}

/// Expands one bundle into its extraction target.
///
/// Entries are written into a staging directory next to the bundle and moved
/// into place only once the whole archive decoded, so a failure never leaves
/// a partial target behind.
pub fn extract_bundle(bundle: &Path) -> Result<BundleOutcome, ExtractError> {
    if let Some(target) = existing_extraction(bundle) {
        return Ok(BundleOutcome::AlreadyExtracted { target });
    }
    let target = extraction_target(bundle);

    let io_err = |source: io::Error| ExtractError::Io {
        path: bundle.to_path_buf(),
        source,
    };
    let corrupt = |message: String| ExtractError::ArchiveCorrupt {
        path: bundle.to_path_buf(),
        message,
    };

    let file = File::open(bundle).map_err(io_err)?;
    let mut archive = ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;

    // `Notes.zip` holding `Notes/...` expands to `Notes/...`, not `Notes/Notes/...`.
    let stem_prefix = target
        .file_name()
        .map(|n| format!("{}/", n.to_string_lossy()))
        .unwrap_or_default();
    let strip_stem = archive.len() > 0
        && !stem_prefix.is_empty()
        && archive.file_names().all(|name| name.starts_with(&stem_prefix));

    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(parent)
        .map_err(io_err)?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| corrupt(e.to_string()))?;
        let Some(name) = entry.enclosed_name() else {
            notes_warn!("Skipping unsafe entry {:?} in {:?}", entry.name(), bundle);
            continue;
        };
        let relative = if strip_stem {
            name.components().skip(1).collect::<PathBuf>()
        } else {
            name
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out_path = staging.path().join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(io_err)?;
            continue;
        }
        if let Some(dir) = out_path.parent() {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let mut out = File::create(&out_path).map_err(io_err)?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| corrupt(format!("entry {:?}: {e}", relative)))?;
    }

    fs::rename(staging.path(), &target).map_err(io_err)?;
    Ok(BundleOutcome::Extracted { target })
}
