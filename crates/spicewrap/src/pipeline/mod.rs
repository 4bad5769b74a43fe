//! Cleanup of preprocessed header text before scanning
//!
//! ## Stages
//!
//! 1. **Line marker removal** - drop `# 12 "file.h"` markers and leftover
//!    `#pragma` lines emitted by the preprocessor
//! 2. **GCC neutralization** - remove compiler extensions that would be read
//!    as type or name tokens
//!
//! The output keeps one line per input line that survived stage 1, so the
//! scanner still sees declarations split the way the header splits them.

mod gcc;

pub use gcc::{ExtensionKind, GccNeutralizer, Neutralized, Removal};

/// Counters describing what the cleanup removed
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NeutralizeStats {
    pub line_markers: usize,
    pub attributes: usize,
    pub extensions: usize,
    pub restricts: usize,
    pub inlines: usize,
}

impl NeutralizeStats {
    fn record(&mut self, kind: ExtensionKind) {
        match kind {
            ExtensionKind::Attribute => self.attributes += 1,
            ExtensionKind::Extension => self.extensions += 1,
            ExtensionKind::Restrict => self.restricts += 1,
            ExtensionKind::Inline => self.inlines += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.line_markers + self.attributes + self.extensions + self.restricts + self.inlines
    }
}

/// Run both cleanup stages over preprocessed text
pub fn neutralize(expanded: &str) -> (String, NeutralizeStats) {
    let mut stats = NeutralizeStats::default();

    let kept: Vec<&str> = expanded
        .lines()
        .filter(|line| {
            let is_marker = line.trim_start().starts_with('#');
            if is_marker {
                stats.line_markers += 1;
            }
            !is_marker
        })
        .collect();

    let result = GccNeutralizer::new().neutralize(&kept.join("\n"));
    for removal in &result.removals {
        stats.record(removal.kind);
    }

    (result.code, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutralize_drops_line_markers() {
        let source = r#"# 1 "SpiceUsr.h"
# 1 "<built-in>"
void utc2et_c ( ConstSpiceChar * utcstr,
                SpiceDouble    * et );
#pragma once
"#;
        let (code, stats) = neutralize(source);

        assert!(!code.contains('#'));
        assert_eq!(stats.line_markers, 3);
        assert_eq!(code.lines().count(), 2);
        assert!(code.starts_with("void utc2et_c"));
    }

    #[test]
    fn test_neutralize_counts_extensions() {
        let source = "__extension__ typedef long long int64_t;\n\
                      extern int atexit (void (*) (void)) __attribute__ ((__nothrow__ , __leaf__));\n\
                      char * __restrict s;";
        let (code, stats) = neutralize(source);

        assert_eq!(stats.extensions, 1);
        assert_eq!(stats.attributes, 1);
        assert_eq!(stats.restricts, 1);
        assert_eq!(stats.total(), 3);
        assert!(!code.contains("__"));
    }

    #[test]
    fn test_neutralize_empty_input() {
        let (code, stats) = neutralize("");
        assert!(code.is_empty());
        assert_eq!(stats, NeutralizeStats::default());
    }
}
