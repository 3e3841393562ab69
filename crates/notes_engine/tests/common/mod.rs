#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use notes_engine::{ConversionError, ConversionFailure, Converter, PipelineSettings};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Writes a zip at `path` holding `(name, content)` file entries.
pub fn build_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn settings_for(root: &Path) -> PipelineSettings {
    PipelineSettings {
        max_concurrency: 4,
        ..PipelineSettings::with_root(root)
    }
}

/// In-process converter: fails for sources whose file name contains `fail`,
/// returns an empty document for names containing `blank`, and echoes the
/// file stem as a heading otherwise.
#[derive(Default)]
pub struct FakeConverter {
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<PathBuf>>,
    pub delay: Option<Duration>,
}

impl FakeConverter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Converter for FakeConverter {
    async fn convert(&self, source: &Path) -> Result<String, ConversionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(source.to_path_buf());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let name = source.file_name().unwrap().to_string_lossy().into_owned();
        if !source.exists() {
            return Err(ConversionError {
                kind: ConversionFailure::ConversionFailed,
                message: format!("{name} does not exist"),
            });
        }
        if name.contains("fail") || name.contains("page2") {
            return Err(ConversionError {
                kind: ConversionFailure::ConversionFailed,
                message: format!("cannot parse {name}"),
            });
        }
        if name.contains("blank") {
            return Ok(String::new());
        }
        let stem = source.file_stem().unwrap().to_string_lossy();
        Ok(format!("# {stem}\n\nconverted\n"))
    }
}
