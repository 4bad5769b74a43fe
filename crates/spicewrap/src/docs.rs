//! Docstring extraction from the CSPICE source tree
//!
//! Each `<name>.c` file carries its documentation in a header comment split
//! into sections such as `-Abstract` and `-Brief_I/O`. The configured
//! sections are copied into one C string literal.

use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Source of docstrings for generated wrappers
pub trait DocSource {
    /// A complete C string literal for `function`, `""` when nothing is known
    fn docstring(&self, function: &str) -> String;
}

/// Empty docstrings for every function
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDocs;

impl DocSource for NoDocs {
    fn docstring(&self, _function: &str) -> String {
        "\"\"".to_string()
    }
}

/// Reads `<src_dir>/<function>.c`
#[derive(Debug, Clone)]
pub struct DocExtractor {
    src_dir: PathBuf,
    sections: Vec<String>,
}

impl DocExtractor {
    pub fn new(src_dir: impl Into<PathBuf>, sections: Vec<String>) -> Self {
        Self {
            src_dir: src_dir.into(),
            sections,
        }
    }

    pub fn source_file(&self, function: &str) -> PathBuf {
        self.src_dir.join(format!("{function}.c"))
    }

    fn read(&self, path: &Path) -> Option<String> {
        if !path.exists() {
            return None;
        }
        match std::fs::read(path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                warn!("Unable to read {}: {e}", path.display());
                None
            }
        }
    }
}

impl DocSource for DocExtractor {
    fn docstring(&self, function: &str) -> String {
        let path = self.source_file(function);
        match self.read(&path) {
            Some(source) => {
                let doc = extract_sections(&source, &self.sections);
                debug!("{function}: {} bytes of documentation", doc.len());
                format!("\"{doc}\"")
            }
            None => "\"\"".to_string(),
        }
    }
}

/// Escape a line for use inside a C string literal
pub fn escape_line(line: &str) -> String {
    line.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Copy the named sections out of `source`, escaped, one `\n` per line.
///
/// A section runs until the next line starting with `-` or the end of the
/// text. Blank lines inside a section are kept as bare newlines.
pub fn extract_sections(source: &str, sections: &[String]) -> String {
    let mut doc = String::new();
    let mut copying = false;

    for line in source.lines().map(str::trim_end) {
        if copying {
            if line.is_empty() {
                doc.push_str("\\n");
                continue;
            }
            if !line.starts_with('-') {
                doc.push_str(&escape_line(line));
                doc.push_str("\\n");
                continue;
            }
            copying = false;
        }

        let Some(first) = line.split_whitespace().next() else {
            continue;
        };
        if sections.iter().any(|s| s == first) {
            copying = true;
            doc.push_str(&escape_line(line));
            doc.push_str("\\n");
        }
    }

    doc
}
