use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Argument replaced by the source path when the converter is invoked.
pub const INPUT_PLACEHOLDER: &str = "{input}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterSettings {
    pub program: String,
    /// Arguments in order; `{input}` marks where the source path goes.
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl ConverterSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            program: "pandoc".to_string(),
            args: vec![
                INPUT_PLACEHOLDER.to_string(),
                "--from".to_string(),
                "html".to_string(),
                "--to".to_string(),
                "markdown_strict-raw_html".to_string(),
            ],
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub root: PathBuf,
    pub bundle_extension: String,
    pub document_extension: String,
    pub output_extension: String,
    /// Glob patterns; a bundle matching any of them is never extracted.
    pub exclude_patterns: Vec<String>,
    pub converter: ConverterSettings,
    pub max_concurrency: usize,
    pub success_table: String,
    pub failure_table: String,
    /// Markdown files at or below this size count as empty.
    pub empty_threshold_bytes: u64,
    pub holding_dir_name: String,
    pub remove_bundles: bool,
    pub archive_empty: bool,
}

impl PipelineSettings {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn archive_file_name(&self) -> String {
        format!("{}.zip", self.holding_dir_name)
    }

    pub(crate) fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            bundle_extension: "zip".to_string(),
            document_extension: "html".to_string(),
            output_extension: "md".to_string(),
            exclude_patterns: Vec::new(),
            converter: ConverterSettings::default(),
            max_concurrency: default_concurrency(),
            success_table: "win_list.csv".to_string(),
            failure_table: "fail_list.csv".to_string(),
            empty_threshold_bytes: 1,
            holding_dir_name: "empty_notes".to_string(),
            remove_bundles: true,
            archive_empty: true,
        }
    }
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
