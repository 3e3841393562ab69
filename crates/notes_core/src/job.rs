use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::sanitize::sanitize_dir_name;

/// One discovered source document and where its markdown goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Source path after the rename pre-pass.
    pub source: PathBuf,
    /// Parent directory name as discovered.
    pub original_dir_name: String,
    /// Sanitized form of `original_dir_name`. Empty when nothing survives
    /// sanitizing, in which case the directory kept its original name.
    pub sanitized_dir_name: String,
    /// Sibling of `source` with the output extension.
    pub destination: PathBuf,
}

impl ConversionJob {
    pub fn new(source: PathBuf, original_dir_name: String, output_extension: &str) -> Self {
        let sanitized_dir_name = sanitize_dir_name(&original_dir_name);
        let destination = destination_for(&source, output_extension);
        Self {
            source,
            original_dir_name,
            sanitized_dir_name,
            destination,
        }
    }
}

/// Same stem, output extension, same directory.
pub fn destination_for(source: &Path, output_extension: &str) -> PathBuf {
    source.with_extension(output_extension)
}

/// Splits jobs into those with unique destinations and the later duplicates.
///
/// The first job (in the given order) to claim a destination keeps it.
pub fn dedupe_destinations(jobs: Vec<ConversionJob>) -> (Vec<ConversionJob>, Vec<ConversionJob>) {
    let mut claimed = HashSet::new();
    let mut unique = Vec::with_capacity(jobs.len());
    let mut duplicates = Vec::new();
    for job in jobs {
        if claimed.insert(job.destination.clone()) {
            unique.push(job);
        } else {
            duplicates.push(job);
        }
    }
    (unique, duplicates)
}

/// A single directory rename, expressed with the paths valid at the moment
/// it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Directory renames needed before any document in a run is converted.
///
/// Renames are ordered deepest first, so applying one never moves a directory
/// that a later rename still refers to by its original path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    renames: Vec<DirRename>,
}

impl RenamePlan {
    /// Collects the distinct parent directories of `sources` below `root` and
    /// plans one rename for each whose name is not already sanitized.
    ///
    /// The root itself, directories outside it, and names that sanitize to
    /// nothing are left alone.
    pub fn build<'a>(root: &Path, sources: impl IntoIterator<Item = &'a Path>) -> Self {
        let dirs: BTreeSet<&Path> = sources
            .into_iter()
            .filter_map(Path::parent)
            .filter(|dir| *dir != root && dir.starts_with(root))
            .collect();

        let mut renames: Vec<DirRename> = dirs
            .into_iter()
            .filter_map(|dir| {
                let name = dir.file_name()?.to_string_lossy();
                let sanitized = sanitize_dir_name(&name);
                if sanitized.is_empty() || sanitized == name {
                    return None;
                }
                let parent = dir.parent()?;
                Some(DirRename {
                    from: dir.to_path_buf(),
                    to: parent.join(sanitized),
                })
            })
            .collect();

        renames.sort_by_key(|r| (Reverse(r.from.components().count()), r.from.clone()));
        Self { renames }
    }

    pub fn renames(&self) -> &[DirRename] {
        &self.renames
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// Maps paths discovered before the rename pre-pass onto their current
/// location.
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    renamed: HashMap<PathBuf, OsString>,
    conflicted: HashSet<PathBuf>,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            renamed: HashMap::new(),
            conflicted: HashSet::new(),
        }
    }

    /// Records that the directory originally at `rename.from` now carries the
    /// file name of `rename.to`.
    pub fn record_rename(&mut self, rename: &DirRename) {
        if let Some(name) = rename.to.file_name() {
            self.renamed.insert(rename.from.clone(), name.to_os_string());
        }
    }

    /// Records that the directory originally at `dir` could not be renamed.
    pub fn record_conflict(&mut self, dir: &Path) {
        self.conflicted.insert(dir.to_path_buf());
    }

    /// True when the immediate parent of `source` hit a rename conflict.
    pub fn is_conflicted(&self, source: &Path) -> bool {
        source
            .parent()
            .map(|dir| self.conflicted.contains(dir))
            .unwrap_or(false)
    }

    /// Current path of `original`, rewriting every renamed ancestor.
    ///
    /// Paths outside the root are returned unchanged.
    pub fn resolve(&self, original: &Path) -> PathBuf {
        let Ok(relative) = original.strip_prefix(&self.root) else {
            return original.to_path_buf();
        };
        let mut original_prefix = self.root.clone();
        let mut current = self.root.clone();
        for component in relative.components() {
            original_prefix.push(component);
            match self.renamed.get(&original_prefix) {
                Some(name) => current.push(name),
                None => current.push(component),
            }
        }
        current
    }
}
