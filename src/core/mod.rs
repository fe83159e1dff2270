use std::path::Path;
use std::process::{Command, Stdio};

pub mod board;
pub mod catalog;
pub mod command;
pub mod config;
pub mod editor;
pub mod error;
pub mod event;
pub mod formatter;
pub mod job;
pub mod progress;
pub mod runner;
pub mod summary;

use command::ToolCommand;
use config::Config;
use error::BoardflowError;

/// Runs the tool to completion and returns its stdout. A non-zero exit
/// becomes `ExternalTool` with the captured stderr.
pub fn run_captured(config: &Config, command: &ToolCommand) -> Result<String, BoardflowError> {
    let binary = config.tool();
    tracing::debug!(binary = %binary.display(), args = ?command.to_args(), "running tool");

    let output = Command::new(binary)
        .args(command.to_args())
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(binary, e))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        tracing::warn!(
            command = command.label(),
            exit_code = ?output.status.code(),
            "tool exited unsuccessfully"
        );
        Err(BoardflowError::ExternalTool {
            exit_code: output.status.code(),
            stderr,
        })
    }
}

/// `sketch new <name>`; returns whatever the tool printed.
pub fn create_sketch(config: &Config, name: &str) -> Result<String, BoardflowError> {
    if name.trim().is_empty() {
        return Err(BoardflowError::invalid("sketch name must not be empty"));
    }

    let stdout = run_captured(
        config,
        &ToolCommand::NewSketch {
            name: name.to_string(),
        },
    )?;
    tracing::info!(sketch = name, "sketch created");
    Ok(stdout)
}

pub(crate) fn spawn_error(binary: &Path, err: std::io::Error) -> BoardflowError {
    if err.kind() == std::io::ErrorKind::NotFound {
        BoardflowError::BinaryNotFound {
            binary: binary.display().to_string(),
        }
    } else {
        BoardflowError::ExternalTool {
            exit_code: None,
            stderr: err.to_string(),
        }
    }
}
