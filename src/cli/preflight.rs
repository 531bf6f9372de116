//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools are available before starting work that
//! would otherwise fail after the article was already fetched and spoken.

use crate::audio::AudioFormat;
use crate::error::{Result, WikiVoxError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Audio synthesis; m4b output also needs ffmpeg.
    Synthesize(AudioFormat),
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Synthesize(format) if format == AudioFormat::M4b => check_tool("ffmpeg"),
        Operation::Synthesize(_) => Ok(()),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(WikiVoxError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(WikiVoxError::ToolNotFound(name.to_string())),
        Err(e) => Err(WikiVoxError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
