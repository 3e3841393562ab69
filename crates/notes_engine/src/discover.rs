use std::path::{Path, PathBuf};

use notes_logging::notes_warn;
use walkdir::WalkDir;

/// Recursively lists regular files under `root` whose extension matches
/// `extension` (ASCII case-insensitive), sorted by path.
///
/// Unreadable entries are logged and skipped.
pub fn discover_files(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                notes_warn!("Skipping unreadable entry under {:?}: {}", root, err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extension))
        .collect();
    found.sort();
    found
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_ignores_ascii_case() {
        assert!(has_extension(Path::new("a/Page.HTML"), "html"));
        assert!(!has_extension(Path::new("a/page.htm"), "html"));
        assert!(!has_extension(Path::new("a/html"), "html"));
    }
}
