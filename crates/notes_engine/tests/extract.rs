mod common;

use std::fs;

use common::build_zip;
use notes_engine::{
    existing_extraction, extract_bundle, extract_bundles, BundleOutcome, ExclusionSet,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[test]
fn bundle_rooted_under_its_stem_is_not_nested_twice() {
    let temp = TempDir::new().unwrap();
    let bundle = temp.path().join("Notes.zip");
    build_zip(
        &bundle,
        &[("Notes/page1.html", "<p>one</p>"), ("Notes/page2.html", "<p>two</p>")],
    );

    let outcome = extract_bundle(&bundle).unwrap();

    assert_eq!(
        outcome,
        BundleOutcome::Extracted {
            target: temp.path().join("Notes")
        }
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("Notes/page1.html")).unwrap(),
        "<p>one</p>"
    );
    assert!(temp.path().join("Notes/page2.html").exists());
    assert!(!temp.path().join("Notes/Notes").exists());
}

#[test]
fn flat_bundle_expands_into_sibling_directory() {
    let temp = TempDir::new().unwrap();
    let bundle = temp.path().join("Export 1.zip");
    build_zip(&bundle, &[("a.html", "A"), ("Sub/b.html", "B")]);

    extract_bundle(&bundle).unwrap();

    assert!(temp.path().join("Export 1/a.html").is_file());
    assert!(temp.path().join("Export 1/Sub/b.html").is_file());
}

#[test]
fn existing_target_is_left_alone() {
    let temp = TempDir::new().unwrap();
    let bundle = temp.path().join("Notes.zip");
    build_zip(&bundle, &[("Notes/page1.html", "new")]);
    fs::create_dir(temp.path().join("Notes")).unwrap();
    fs::write(temp.path().join("Notes/page1.html"), "old").unwrap();

    let outcome = extract_bundle(&bundle).unwrap();

    assert!(matches!(outcome, BundleOutcome::AlreadyExtracted { .. }));
    assert_eq!(
        fs::read_to_string(temp.path().join("Notes/page1.html")).unwrap(),
        "old"
    );
}

#[test]
fn bundle_whose_directory_was_sanitized_counts_as_extracted() {
    let temp = TempDir::new().unwrap();
    let bundle = temp.path().join("Trip #3!.zip");
    build_zip(&bundle, &[("day1.html", "new")]);
    fs::create_dir(temp.path().join("Trip 3")).unwrap();
    fs::write(temp.path().join("Trip 3/day1.html"), "old").unwrap();

    assert_eq!(existing_extraction(&bundle), Some(temp.path().join("Trip 3")));
    let outcome = extract_bundle(&bundle).unwrap();

    assert_eq!(
        outcome,
        BundleOutcome::AlreadyExtracted {
            target: temp.path().join("Trip 3")
        }
    );
    assert!(!temp.path().join("Trip #3!").exists());
    assert_eq!(
        fs::read_to_string(temp.path().join("Trip 3/day1.html")).unwrap(),
        "old"
    );
}

#[test]
fn fresh_bundle_has_no_existing_extraction() {
    let temp = TempDir::new().unwrap();
    let bundle = temp.path().join("Trip #3!.zip");
    build_zip(&bundle, &[("day1.html", "x")]);
    fs::write(temp.path().join("Trip 3"), "a file, not a directory").unwrap();

    assert_eq!(existing_extraction(&bundle), None);
}

#[test]
fn corrupt_bundle_is_reported_and_leaves_nothing_behind() {
    notes_logging::initialize_for_tests();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("Broken.zip"), b"definitely not a zip").unwrap();
    build_zip(&temp.path().join("Good.zip"), &[("x.html", "x")]);

    let report = extract_bundles(temp.path(), "zip", &[]);

    assert_eq!(report.extracted, vec![temp.path().join("Good.zip")]);
    assert_eq!(report.corrupt, vec![temp.path().join("Broken.zip")]);
    assert!(!temp.path().join("Broken").exists());
    let staging_left = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(Result::ok)
        .any(|e| e.file_name().to_string_lossy().starts_with(".extract-"));
    assert!(!staging_left);
}

#[test]
fn excluded_bundles_are_not_extracted() {
    let temp = TempDir::new().unwrap();
    build_zip(&temp.path().join("keep.zip"), &[("a.html", "a")]);
    build_zip(&temp.path().join("skip-me.zip"), &[("b.html", "b")]);
    fs::create_dir(temp.path().join("archive")).unwrap();
    build_zip(&temp.path().join("archive/old.zip"), &[("c.html", "c")]);

    let patterns = vec!["skip-*.zip".to_string(), "archive/*".to_string()];
    let report = extract_bundles(temp.path(), "zip", &patterns);

    assert_eq!(report.extracted, vec![temp.path().join("keep.zip")]);
    assert_eq!(report.excluded, 2);
    assert!(!temp.path().join("skip-me").exists());
    assert!(!temp.path().join("archive/old").exists());
}

#[test]
fn invalid_exclude_patterns_are_ignored() {
    let set = ExclusionSet::new(&["[".to_string(), "*.zip".to_string()]);
    let root = std::path::Path::new("/data");
    assert!(set.is_excluded(root, std::path::Path::new("/data/x/a.zip")));
}
