//! Macro preprocessing of the toolkit header
//!
//! The generator never expands macros itself. An external C preprocessor is
//! run over the header and its entire output is buffered before scanning
//! starts. Already-expanded files can be fed in directly.

use log::debug;
use spicewrap_api::{GenerateError, GenerateResult, PreprocessorCommand};
use std::path::Path;
use std::process::Command;

/// Produces macro-expanded header text
pub trait Preprocess {
    fn expand(&self, header: &Path) -> GenerateResult<String>;
}

/// Runs an external preprocessor such as `gcc -E`
#[derive(Debug, Clone, Default)]
pub struct GccPreprocessor {
    command: PreprocessorCommand,
}

impl GccPreprocessor {
    pub fn new(command: PreprocessorCommand) -> Self {
        Self { command }
    }

    /// The command line as it would be typed in a shell
    pub fn command_line(&self, header: &Path) -> String {
        let mut parts = vec![self.command.program.clone()];
        parts.extend(self.command.args.iter().cloned());
        parts.push(header.display().to_string());
        parts.join(" ")
    }
}

impl Preprocess for GccPreprocessor {
    fn expand(&self, header: &Path) -> GenerateResult<String> {
        if !header.exists() {
            return Err(GenerateError::MissingPath(header.to_path_buf()));
        }

        let command_line = self.command_line(header);
        debug!("running {command_line}");

        let output = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(header)
            .output()
            .map_err(|e| GenerateError::Preprocessor {
                command: command_line.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(GenerateError::Preprocessor {
                command: command_line,
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Reads a header that has already been expanded
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughPreprocessor;

impl Preprocess for PassthroughPreprocessor {
    fn expand(&self, header: &Path) -> GenerateResult<String> {
        std::fs::read_to_string(header).map_err(|e| GenerateError::Io(header.to_path_buf(), e))
    }
}
