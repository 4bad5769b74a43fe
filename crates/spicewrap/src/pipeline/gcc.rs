//! Stripping of compiler extensions
//!
//! `gcc -E` output still carries `__attribute__`, `__extension__`,
//! `__restrict` and `__inline`. Left in place they end up glued to a return
//! type or a parameter type, so they are cut out here and each cut is kept as
//! a [`Removal`].

use regex::Regex;
use std::sync::LazyLock;

/// Which extension a [`Removal`] took out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    /// `__attribute__((...))`, arguments included
    Attribute,
    Extension,
    /// `__restrict` or `__restrict__`
    Restrict,
    /// `__inline` or `__inline__`
    Inline,
}

/// One piece of text cut from the header
#[derive(Debug, Clone)]
pub struct Removal {
    /// Byte offset where the cut began, measured after earlier cuts
    pub offset: usize,
    pub kind: ExtensionKind,
    pub text: String,
}

/// Header text with extensions removed
#[derive(Debug)]
pub struct Neutralized {
    pub code: String,
    pub removals: Vec<Removal>,
}

#[derive(Debug, Default)]
pub struct GccNeutralizer;

static ATTRIBUTE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__attribute__\s*\(\(").unwrap());

static KEYWORDS: LazyLock<[(Regex, ExtensionKind); 3]> = LazyLock::new(|| {
    [
        (Regex::new(r"__extension__\s*").unwrap(), ExtensionKind::Extension),
        (Regex::new(r"\b__restrict(?:__)?\b\s*").unwrap(), ExtensionKind::Restrict),
        (Regex::new(r"\b__inline(?:__)?\b\s*").unwrap(), ExtensionKind::Inline),
    ]
});

impl GccNeutralizer {
    pub fn new() -> Self {
        Self
    }

    pub fn neutralize(&self, header: &str) -> Neutralized {
        let mut code = header.to_string();
        let mut removals = Vec::new();

        // Attributes first: their argument lists may contain the keywords
        while let Some(open) = ATTRIBUTE_OPEN.find(&code) {
            let Some(close) = attribute_close(&code, open.end()) else {
                break;
            };
            removals.push(Removal {
                offset: open.start(),
                kind: ExtensionKind::Attribute,
                text: code[open.start()..close].to_string(),
            });
            code.replace_range(open.start()..close, "");
        }

        for (pattern, kind) in KEYWORDS.iter() {
            while let Some(found) = pattern.find(&code) {
                let span = found.range();
                removals.push(Removal {
                    offset: span.start,
                    kind: *kind,
                    text: found.as_str().to_string(),
                });
                code.replace_range(span, "");
            }
        }

        Neutralized { code, removals }
    }
}

/// Offset just past the `))` that balances an attribute's opening `((`.
/// Quoted strings are skipped so parentheses inside them do not count.
fn attribute_close(code: &str, from: usize) -> Option<usize> {
    let bytes = code.as_bytes();
    let mut open = 2usize;
    let mut pos = from;

    while open > 0 {
        match *bytes.get(pos)? {
            b'(' => open += 1,
            b')' => open -= 1,
            b'"' => {
                pos += 1;
                while *bytes.get(pos)? != b'"' {
                    pos += if bytes[pos] == b'\\' { 2 } else { 1 };
                }
            }
            _ => {}
        }
        pos += 1;
    }

    Some(pos)
}
