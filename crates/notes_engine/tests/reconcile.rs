mod common;

use std::fs::{self, File};

use common::{build_zip, settings_for, write_file};
use notes_engine::{archive_empty_outputs, reconcile, remove_extracted_bundles, ArchiveOutcome};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use zip::ZipArchive;

#[test]
fn directories_with_empty_markdown_are_zipped_and_removed() {
    notes_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("Empty/page.md"), "\n");
    write_file(&root.join("Empty/page.html"), "<html></html>");
    write_file(&root.join("Empty/Nested/other.md"), "");
    write_file(&root.join("Full/page.md"), "# Real content\n");
    let settings = settings_for(root);

    let outcome = archive_empty_outputs(root, &settings).unwrap();

    let archive_path = root.join("empty_notes.zip");
    assert_eq!(
        outcome,
        ArchiveOutcome::Archived {
            archive: archive_path.clone(),
            directories: 1,
            move_failures: 0,
        }
    );
    assert!(!root.join("Empty").exists());
    assert!(!root.join("empty_notes").exists());
    assert!(root.join("Full/page.md").exists());

    let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert!(names.contains(&"empty_notes/Empty/page.md".to_string()));
    assert!(names.contains(&"empty_notes/Empty/Nested/other.md".to_string()));
    assert!(archive.by_name("empty_notes/Empty/page.html").is_ok());
}

#[test]
fn existing_archive_is_never_overwritten() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("Empty/page.md"), "");
    fs::write(root.join("empty_notes.zip"), b"previous run").unwrap();
    let settings = settings_for(root);

    let outcome = archive_empty_outputs(root, &settings).unwrap();

    assert!(matches!(outcome, ArchiveOutcome::SkippedExisting { .. }));
    assert!(root.join("Empty/page.md").exists());
    assert_eq!(fs::read(root.join("empty_notes.zip")).unwrap(), b"previous run");
}

#[test]
fn nothing_to_archive_creates_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("Full/page.md"), "# content\n");
    write_file(&root.join("root-level.md"), "");
    let settings = settings_for(root);

    let outcome = archive_empty_outputs(root, &settings).unwrap();

    assert_eq!(outcome, ArchiveOutcome::Nothing);
    assert!(!root.join("empty_notes.zip").exists());
    assert!(!root.join("empty_notes").exists());
    assert!(root.join("root-level.md").exists());
}

#[test]
fn same_named_directories_do_not_collide_in_holding_area() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write_file(&root.join("A/Notes/x.md"), "");
    write_file(&root.join("B/Notes/y.md"), "");
    let settings = settings_for(root);

    let outcome = archive_empty_outputs(root, &settings).unwrap();

    assert!(matches!(
        outcome,
        ArchiveOutcome::Archived { directories: 2, .. }
    ));
    let archive = ZipArchive::new(File::open(root.join("empty_notes.zip")).unwrap()).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"empty_notes/Notes/x.md"));
    assert!(names.contains(&"empty_notes/Notes-2/y.md"));
}

#[test]
fn only_listed_bundles_are_removed() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let extracted = root.join("Notes.zip");
    let untouched = root.join("Other.zip");
    build_zip(&extracted, &[("a.html", "a")]);
    build_zip(&untouched, &[("b.html", "b")]);

    let removed = remove_extracted_bundles(&[extracted.clone(), root.join("gone.zip")]);

    assert_eq!(removed, 1);
    assert!(!extracted.exists());
    assert!(untouched.exists());
}

#[test]
fn disabled_steps_do_nothing() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let bundle = root.join("Notes.zip");
    build_zip(&bundle, &[("a.html", "a")]);
    write_file(&root.join("Empty/page.md"), "");
    let mut settings = settings_for(root);
    settings.remove_bundles = false;
    settings.archive_empty = false;

    let report = reconcile(root, &settings, &[bundle.clone()]);

    assert_eq!(report.bundles_removed, 0);
    assert_eq!(report.archive, ArchiveOutcome::Disabled);
    assert!(bundle.exists());
    assert!(root.join("Empty/page.md").exists());
}
