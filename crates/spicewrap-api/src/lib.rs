//! spicewrap API
//!
//! Shared types for generating CPython extension wrappers from CSPICE
//! prototypes.
//!
//! This crate defines the vocabulary the generator pipeline works in:
//!
//! - **Entities**: prototypes, classified parameters and the per-function
//!   wrapper plan
//! - **Configuration**: the exclusion set, reserved-name table, manual result
//!   overrides and the fixed buffer-length contract
//! - **Metrics**: acceptance counters for one run
//! - **Error handling**: parse, classification and run-level errors
//!
//! # Example
//!
//! ```rust
//! use spicewrap_api::{Dimension, GeneratorConfig, Marshal, Parameter};
//!
//! let config = GeneratorConfig::default();
//! assert!(config.is_excluded("gfevnt_c"));
//! assert_eq!(config.host_name("utc2et_c"), "utc2et");
//!
//! let rotation = Parameter::new("rotate", "SpiceDouble")
//!     .with_marshal(Marshal::Double)
//!     .with_dimensions(vec![Dimension::Fixed(3), Dimension::Fixed(3)]);
//! assert_eq!(rotation.format_tag(), "((ddd)(ddd)(ddd))");
//! ```

pub mod config;
pub mod entities;
pub mod errors;
pub mod metrics;

// Re-export commonly used types
pub use config::{GeneratorConfig, ManualOverride, PreprocessorCommand};
pub use entities::{
    Converters, Dimension, Direction, Marshal, Parameter, Prototype, ResultStrategy, WrapperPlan,
};
pub use errors::{ClassifyError, GenerateError, GenerateResult, ParseError};
pub use metrics::GenerationMetrics;
