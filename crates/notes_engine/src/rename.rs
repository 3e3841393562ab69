use std::fs;
use std::path::{Path, PathBuf};

use notes_core::{DirRename, PathResolver, RenamePlan};
use notes_logging::{notes_info, notes_warn};
use thiserror::Error;

use crate::RenameReport;

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("cannot rename {from:?} to {to:?}: {reason}")]
    RenameConflict {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

/// Applies every planned rename once, in plan order.
///
/// A rename whose target already exists is not attempted; the directory keeps
/// its name and is reported as a conflict so its documents can be skipped.
pub fn apply_renames(root: &Path, plan: &RenamePlan) -> (PathResolver, RenameReport) {
    let mut resolver = PathResolver::new(root);
    let mut report = RenameReport::default();

    for rename in plan.renames() {
        match rename_dir(rename) {
            Ok(()) => {
                notes_info!("Renamed {:?} to {:?}", rename.from, rename.to);
                resolver.record_rename(rename);
                report.renamed += 1;
            }
            Err(err) => {
                notes_warn!("{}; skipping its documents", err);
                resolver.record_conflict(&rename.from);
                report.conflicts.push(rename.from.clone());
            }
        }
    }
    (resolver, report)
}

fn rename_dir(rename: &DirRename) -> Result<(), RenameError> {
    let conflict = |reason: String| RenameError::RenameConflict {
        from: rename.from.clone(),
        to: rename.to.clone(),
        reason,
    };
    if rename.to.exists() {
        return Err(conflict("target already exists".to_string()));
    }
    fs::rename(&rename.from, &rename.to).map_err(|e| conflict(e.to_string()))
}
