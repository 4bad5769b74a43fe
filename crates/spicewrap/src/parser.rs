//! Prototype parser
//!
//! Splits one declaration into return type, pointer flag, function name and
//! raw parameter entries. Parsing happens in two steps so the caller can
//! consult the exclusion set on the name before the parameter list, which is
//! where unsupported declarations (callbacks) fail, is looked at.

use spicewrap_api::{ParseError, Prototype};

/// Collapse every run of whitespace to a single space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Head of a declaration: everything up to the parameter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub return_type: String,
    pub return_is_pointer: bool,
    pub function_name: String,
    /// Text following the function name, starting at the parameter list
    pub remainder: String,
    /// Whitespace-collapsed declaration
    pub text: String,
}

/// Split the return type and function name off a declaration
pub fn split_signature(prototype: &str) -> Result<Signature, ParseError> {
    let text = collapse_whitespace(prototype);
    let tokens: Vec<&str> = text.split(' ').collect();

    let mut return_type = tokens[0].to_string();
    let mut return_is_pointer = false;
    if let Some(stripped) = return_type.strip_suffix('*') {
        return_type = stripped.to_string();
        return_is_pointer = true;
    }

    let mut index = 1;
    if tokens.get(index) == Some(&"*") {
        return_is_pointer = true;
        index += 1;
    }

    let Some(name_token) = tokens.get(index) else {
        return Err(ParseError::MissingFunctionName(text.clone()));
    };
    let mut remainder = tokens[index + 1..].join(" ");

    // An opener stuck to the name belongs to the parameter list
    let mut function_name = match name_token.split_once('(') {
        Some((name, rest)) => {
            remainder = format!("({rest} {remainder}");
            name.to_string()
        }
        None => name_token.to_string(),
    };

    if let Some(stripped) = function_name.strip_prefix('*') {
        function_name = stripped.to_string();
        return_is_pointer = true;
    }

    if function_name.is_empty() || return_type.is_empty() {
        return Err(ParseError::MissingFunctionName(text.clone()));
    }

    Ok(Signature {
        return_type,
        return_is_pointer,
        function_name,
        remainder,
        text,
    })
}

impl Signature {
    /// Extract the parameter entries and finish the prototype
    pub fn into_prototype(self) -> Result<Prototype, ParseError> {
        let list = parameter_list(&self.remainder, &self.function_name)?;
        let parameters = split_parameters(list, &self.function_name)?;

        Ok(Prototype {
            return_type: self.return_type,
            return_is_pointer: self.return_is_pointer,
            function_name: self.function_name,
            parameters,
            text: self.text,
        })
    }
}

/// Parse a complete declaration in one go
pub fn parse_prototype(prototype: &str) -> Result<Prototype, ParseError> {
    split_signature(prototype)?.into_prototype()
}

/// Text strictly between the first `(` and its matching `)`.
///
/// Nested parentheses (function-pointer parameters) are rejected rather than
/// truncated.
fn parameter_list<'a>(text: &'a str, function: &str) -> Result<&'a str, ParseError> {
    let missing = || ParseError::MissingParenthesis {
        function: function.to_string(),
    };

    let open = text.find('(').ok_or_else(missing)?;
    let body = &text[open + 1..];

    for (i, c) in body.char_indices() {
        match c {
            '(' => {
                return Err(ParseError::NestedParenthesis {
                    function: function.to_string(),
                })
            }
            ')' => return Ok(&body[..i]),
            _ => {}
        }
    }

    Err(missing())
}

fn split_parameters(list: &str, function: &str) -> Result<Vec<String>, ParseError> {
    let list = list.trim();
    if list.is_empty() || list == "void" {
        return Ok(Vec::new());
    }

    list.split(',')
        .map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                Err(ParseError::EmptyParameter {
                    function: function.to_string(),
                })
            } else {
                Ok(entry.to_string())
            }
        })
        .collect()
}
