use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::settings::{ConverterSettings, INPUT_PLACEHOLDER};
use crate::{ConversionError, ConversionFailure};

/// Turns one source document into markdown text.
#[async_trait::async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, source: &Path) -> Result<String, ConversionError>;
}

/// Runs an external converter program once per document.
///
/// The source path is passed as its own argv element, never through a shell,
/// so spaces and shell metacharacters in paths need no escaping. Stdout and
/// stderr are both captured; on success the result is stdout followed by
/// stderr.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    settings: ConverterSettings,
}

impl CommandConverter {
    pub fn new(settings: ConverterSettings) -> Self {
        Self { settings }
    }

    fn build_command(&self, source: &Path) -> Command {
        let mut command = Command::new(&self.settings.program);
        for arg in command_args(&self.settings.args, source) {
            command.arg(arg);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait::async_trait]
impl Converter for CommandConverter {
    async fn convert(&self, source: &Path) -> Result<String, ConversionError> {
        let timeout = self.settings.timeout();
        let output = tokio::time::timeout(timeout, self.build_command(source).output())
            .await
            .map_err(|_| {
                ConversionError::new(
                    ConversionFailure::ConversionFailed,
                    format!("timed out after {}s", timeout.as_secs_f64()),
                )
            })?
            .map_err(|err| map_spawn_error(&self.settings.program, err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::new(
                ConversionFailure::ConversionFailed,
                format!("{} exited with {}: {}", self.settings.program, output.status, stderr.trim()),
            ));
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(text)
    }
}

/// Argument list with `{input}` substituted; the path is appended when no
/// placeholder is present.
pub(crate) fn command_args(args: &[String], source: &Path) -> Vec<OsString> {
    let mut substituted = false;
    let mut out: Vec<OsString> = args
        .iter()
        .map(|arg| {
            if arg == INPUT_PLACEHOLDER {
                substituted = true;
                source.as_os_str().to_os_string()
            } else if arg.contains(INPUT_PLACEHOLDER) {
                substituted = true;
                OsString::from(arg.replace(INPUT_PLACEHOLDER, &source.to_string_lossy()))
            } else {
                OsString::from(arg)
            }
        })
        .collect();
    if !substituted {
        out.push(source.as_os_str().to_os_string());
    }
    out
}

fn map_spawn_error(program: &str, err: io::Error) -> ConversionError {
    if err.kind() == io::ErrorKind::NotFound {
        return ConversionError::new(
            ConversionFailure::ToolUnavailable,
            format!("{program} not found: {err}"),
        );
    }
    ConversionError::new(ConversionFailure::ConversionFailed, err.to_string())
}
