use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while splitting a prototype into its pieces
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Prototype text did not contain a function name after the return type
    #[error("No function name found in prototype: {0}")]
    MissingFunctionName(String),

    /// Parameter list opener or closer is missing
    #[error("Unable to locate parameter list parentheses for {function}")]
    MissingParenthesis { function: String },

    /// Parameter list contains a nested parenthesised expression
    #[error("Nested parentheses in parameter list of {function} are not supported")]
    NestedParenthesis { function: String },

    /// A parameter entry has a type but no name
    #[error("Parameter '{entry}' in {function} has no name")]
    UnnamedParameter { function: String, entry: String },

    /// A parameter entry was empty (e.g. a trailing comma)
    #[error("Empty parameter entry in {function}")]
    EmptyParameter { function: String },

    /// Array brackets held something other than a positive count
    #[error("Invalid array dimension '{text}' in parameter '{entry}'")]
    BadDimension { entry: String, text: String },
}

/// Errors raised while classifying parameters of one prototype
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// None of the direction rules matched
    #[error("Cannot determine direction of '{parameter}' in {function}")]
    UnknownDirection { function: String, parameter: String },

    /// An array has an unknown dimension and nothing supplies its size
    #[error("Array '{parameter}' in {function} has no known size")]
    UnsizedArray { function: String, parameter: String },

    /// Array shape the generator has no marshaling strategy for
    #[error("Unsupported array shape for '{parameter}' in {function}")]
    UnsupportedArray { function: String, parameter: String },

    /// A manual override names a parameter the prototype does not have
    #[error("Override for {function} refers to missing parameter '{name}'")]
    MissingOverrideTarget { function: String, name: String },

    /// Return type cannot be handed back to the host runtime
    #[error("Unsupported return type '{return_type}' for {function}")]
    UnsupportedReturn {
        function: String,
        return_type: String,
    },
}

/// Errors that abort or localise a generation run
#[derive(Error, Debug)]
pub enum GenerateError {
    /// Failed to read or write a file
    #[error("IO error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// A required toolkit path does not exist
    #[error("Unable to find {0}")]
    MissingPath(PathBuf),

    /// The external preprocessor could not be run or exited with failure
    #[error("Preprocessor `{command}` failed: {message}")]
    Preprocessor { command: String, message: String },

    /// Configuration could not be loaded
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Prototype could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Prototype could not be classified
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl GenerateError {
    /// Whether this error stops the whole run rather than a single prototype
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GenerateError::Parse(_) | GenerateError::Classify(_))
    }
}

/// Result type for generator operations
pub type GenerateResult<T> = Result<T, GenerateError>;
