use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use notes_engine::PipelineSettings;
use notes_logging::notes_info;

use crate::cli::Cli;

/// Defaults, then the optional RON file, then command-line flags.
pub fn resolve_settings(cli: &Cli) -> Result<PipelineSettings> {
    let mut settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => PipelineSettings::default(),
    };
    cli.apply(&mut settings);
    Ok(settings)
}

/// Reads a RON settings file; fields it omits keep their defaults.
pub fn load_settings(path: &Path) -> Result<PipelineSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {path:?}"))?;
    let settings: PipelineSettings = ron::from_str(&content)
        .with_context(|| format!("failed to parse config file {path:?}"))?;
    notes_info!("Loaded settings from {:?}", path);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("notes.ron");
        fs::write(
            &path,
            r#"(
                root: "/exports",
                exclude_patterns: ["Trash*.zip"],
                converter: (program: "pandoc3", timeout_secs: 30),
            )"#,
        )
        .unwrap();

        let settings = load_settings(&path).unwrap();

        assert_eq!(settings.root, PathBuf::from("/exports"));
        assert_eq!(settings.exclude_patterns, vec!["Trash*.zip".to_string()]);
        assert_eq!(settings.converter.program, "pandoc3");
        assert_eq!(settings.converter.timeout_secs, 30);
        assert_eq!(settings.converter.args, PipelineSettings::default().converter.args);
        assert_eq!(settings.success_table, "win_list.csv");
    }

    #[test]
    fn flags_override_file_values() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("notes.ron");
        fs::write(&path, r#"(root: "/exports", max_concurrency: 2, exclude_patterns: ["a.zip"])"#)
            .unwrap();
        let config_arg = path.to_string_lossy().into_owned();

        let cli = Cli::parse_from([
            "notes2md",
            "/elsewhere",
            "--config",
            config_arg.as_str(),
            "--jobs",
            "6",
            "--exclude",
            "b.zip",
            "--keep-bundles",
        ]);
        let settings = resolve_settings(&cli).unwrap();

        assert_eq!(settings.root, PathBuf::from("/elsewhere"));
        assert_eq!(settings.max_concurrency, 6);
        assert_eq!(settings.exclude_patterns, vec!["a.zip".to_string(), "b.zip".to_string()]);
        assert!(!settings.remove_bundles);
        assert!(settings.archive_empty);
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let err = load_settings(Path::new("/definitely/missing/notes.ron")).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
