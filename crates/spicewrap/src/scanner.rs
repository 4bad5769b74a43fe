//! Prototype scanner
//!
//! Walks the preprocessed header line by line and gathers complete function
//! declarations. A declaration starts on a line whose first token is one of
//! the configured return-type keywords and which contains an opening
//! parenthesis; it ends at the first line whose text ends with `;`.
//! Everything else is ignored without diagnostics.

use log::trace;
use spicewrap_api::GeneratorConfig;

/// Result of scanning one header
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanOutput {
    /// Complete prototypes in discovery order
    pub prototypes: Vec<String>,
    /// Text of a declaration still open when the input ended
    pub unterminated: Option<String>,
}

enum State {
    Idle,
    Accumulating(String),
}

/// Line-oriented declaration scanner
#[derive(Debug, Clone, Copy)]
pub struct PrototypeScanner<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> PrototypeScanner<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    fn starts_declaration(&self, line: &str) -> bool {
        line.contains('(')
            && line
                .split_whitespace()
                .next()
                .is_some_and(|first| self.config.is_return_keyword(first))
    }

    /// Split `text` into complete prototypes
    pub fn scan(&self, text: &str) -> ScanOutput {
        let mut output = ScanOutput::default();
        let mut state = State::Idle;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            state = match state {
                State::Idle if self.starts_declaration(line) => {
                    State::Accumulating(line.to_string())
                }
                State::Idle => State::Idle,
                State::Accumulating(mut buffer) => {
                    buffer.push(' ');
                    buffer.push_str(line);
                    State::Accumulating(buffer)
                }
            };

            if let State::Accumulating(buffer) = &state {
                if buffer.ends_with(';') {
                    trace!("prototype: {buffer}");
                    output.prototypes.push(buffer.clone());
                    state = State::Idle;
                }
            }
        }

        if let State::Accumulating(buffer) = state {
            output.unterminated = Some(buffer);
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> ScanOutput {
        PrototypeScanner::new(&GeneratorConfig::default()).scan(text)
    }

    #[test]
    fn test_scan_single_line() {
        let out = scan("SpiceBoolean failed_c ( void );");

        assert_eq!(out.prototypes, vec!["SpiceBoolean failed_c ( void );"]);
        assert!(out.unterminated.is_none());
    }

    #[test]
    fn test_scan_multi_line_joins_trimmed_lines() {
        let text = "   void utc2et_c ( ConstSpiceChar * utcstr,\n\n                   SpiceDouble    * et   );\n";
        let out = scan(text);

        assert_eq!(
            out.prototypes,
            vec!["void utc2et_c ( ConstSpiceChar * utcstr, SpiceDouble    * et   );"]
        );
    }

    #[test]
    fn test_scan_ignores_other_lines() {
        let text = r#"
typedef int SpiceInt;
extern int printf (const char *, ...);
int main ( void );
void
SpiceDouble dpr_c ( void );
"#;
        let out = scan(text);

        // `void` alone has no parenthesis, `int` is not a keyword
        assert_eq!(out.prototypes, vec!["SpiceDouble dpr_c ( void );"]);
    }

    #[test]
    fn test_scan_keyword_must_be_whole_token() {
        let out = scan("voidness_c ( void );\nSpiceInts n_c ( void );");
        assert!(out.prototypes.is_empty());
    }

    #[test]
    fn test_scan_multiple_in_order() {
        let text = r#"
void furnsh_c ( ConstSpiceChar * file );
SpiceDouble vnorm_c ( ConstSpiceDouble v1[3] );
void pxform_c ( ConstSpiceChar * from,
                ConstSpiceChar * to,
                SpiceDouble et,
                SpiceDouble rotate[3][3] );
"#;
        let out = scan(text);

        assert_eq!(out.prototypes.len(), 3);
        assert!(out.prototypes[0].contains("furnsh_c"));
        assert!(out.prototypes[1].contains("vnorm_c"));
        assert!(out.prototypes[2].contains("pxform_c"));
        assert!(out.prototypes[2].ends_with("rotate[3][3] );"));
    }

    #[test]
    fn test_scan_reports_unterminated() {
        let text = "void spkezr_c ( ConstSpiceChar * targ,\n SpiceDouble et,";
        let out = scan(text);

        assert!(out.prototypes.is_empty());
        assert_eq!(
            out.unterminated.as_deref(),
            Some("void spkezr_c ( ConstSpiceChar * targ, SpiceDouble et,")
        );
    }

    #[test]
    fn test_scan_custom_keywords() {
        let config = GeneratorConfig {
            return_keywords: vec!["int".to_string()],
            ..Default::default()
        };
        let out = PrototypeScanner::new(&config).scan("int main ( void );\nvoid f_c ( void );");

        assert_eq!(out.prototypes, vec!["int main ( void );"]);
    }
}
