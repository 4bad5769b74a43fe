//! # spicewrap
//!
//! Generates a CPython extension module wrapping the CSPICE toolkit from its
//! macro-expanded public header.
//!
//! ## Pipeline
//!
//! - **Preprocessing**: the header is expanded by an external C preprocessor
//!   ([`preprocessor`]) and cleaned of line markers and GCC extensions
//!   ([`pipeline`])
//! - **Scanning**: complete prototypes are gathered line by line
//!   ([`scanner`])
//! - **Parsing and classification**: each prototype is split into its pieces
//!   and its parameters are sorted into inputs and outputs ([`parser`],
//!   [`classifier`])
//! - **Emission**: one C wrapper per accepted function ([`emitter`]), with a
//!   docstring pulled from the toolkit sources ([`docs`])
//! - **Assembly**: wrappers, method table and module initializer in one
//!   translation unit ([`assembler`]), plus the companion header
//!   ([`support`])
//!
//! ## Quick Start
//!
//! ```rust
//! use spicewrap::{docs::NoDocs, Generator};
//!
//! let header = "void utc2et_c ( ConstSpiceChar * utcstr, SpiceDouble * et );\n";
//! let generation = Generator::default().generate_from_text(header, &NoDocs);
//!
//! assert_eq!(generation.metrics.accepted, 1);
//! assert!(generation.source.contains("spice_utc2et"));
//! ```
//!
//! Against an unpacked toolkit:
//!
//! ```rust,no_run
//! use spicewrap::{GccPreprocessor, Generator, ToolkitLayout};
//! use spicewrap_api::GeneratorConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GeneratorConfig::default();
//! let preprocessor = GccPreprocessor::new(config.preprocessor.clone());
//! let toolkit = ToolkitLayout::from_root("/opt/cspice");
//!
//! let generation = Generator::new(config).generate(&toolkit, &preprocessor)?;
//! eprintln!("{}", generation.metrics.summary());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod classifier;
pub mod docs;
pub mod emitter;
mod generator;
pub mod parser;
pub mod pipeline;
pub mod preprocessor;
pub mod scanner;
pub mod support;

// Re-export api types for convenience
pub use spicewrap_api::{
    GenerateError, GenerateResult, GenerationMetrics, GeneratorConfig, Prototype, WrapperPlan,
};

pub use assembler::{render_module, GenerationContext};
pub use classifier::Classifier;
pub use docs::{DocExtractor, DocSource};
pub use emitter::{EmittedWrapper, Registration, WrapperEmitter};
pub use generator::{Generation, Generator, ToolkitLayout};
pub use preprocessor::{GccPreprocessor, PassthroughPreprocessor, Preprocess};
pub use scanner::PrototypeScanner;
pub use support::render_support_header;
