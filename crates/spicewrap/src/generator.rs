//! End-to-end generation
//!
//! Ties the stages together: clean the expanded header, scan it for
//! prototypes, and push each prototype through parse, classify and emit.
//! A fault in one prototype is logged and counted; only setup problems
//! (missing toolkit paths, a failing preprocessor) abort the run.

use log::{debug, error, info, trace, warn};
use spicewrap_api::{GenerateError, GenerateResult, GenerationMetrics, GeneratorConfig, WrapperPlan};
use std::path::PathBuf;
use std::time::Instant;

use crate::assembler::{render_module, GenerationContext};
use crate::classifier::Classifier;
use crate::docs::{DocExtractor, DocSource};
use crate::emitter::WrapperEmitter;
use crate::parser::split_signature;
use crate::pipeline::neutralize;
use crate::preprocessor::Preprocess;
use crate::scanner::PrototypeScanner;

/// Locations inside an unpacked CSPICE toolkit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolkitLayout {
    pub root: PathBuf,
    /// Public header, `include/SpiceUsr.h`
    pub header: PathBuf,
    /// Per-function sources, `src/cspice`
    pub src_dir: PathBuf,
}

impl ToolkitLayout {
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            header: root.join("include").join("SpiceUsr.h"),
            src_dir: root.join("src").join("cspice"),
            root,
        }
    }

    /// Both the header and the source directory must exist
    pub fn validate(&self) -> GenerateResult<()> {
        for path in [&self.header, &self.src_dir] {
            if !path.exists() {
                return Err(GenerateError::MissingPath(path.clone()));
            }
        }
        Ok(())
    }
}

/// Output of one run
#[derive(Debug, Clone)]
pub struct Generation {
    /// The complete translation unit
    pub source: String,
    pub metrics: GenerationMetrics,
}

/// Wrapper generator for one configuration
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Run against a toolkit, expanding its header with `preprocessor`
    pub fn generate(
        &self,
        toolkit: &ToolkitLayout,
        preprocessor: &dyn Preprocess,
    ) -> GenerateResult<Generation> {
        toolkit.validate()?;
        info!("Generating wrappers from {}", toolkit.root.display());

        let expanded = preprocessor.expand(&toolkit.header)?;
        let docs = DocExtractor::new(&toolkit.src_dir, self.config.doc_sections.clone());

        Ok(self.generate_from_text(&expanded, &docs))
    }

    /// Run against already-expanded header text
    pub fn generate_from_text(&self, expanded: &str, docs: &dyn DocSource) -> Generation {
        let start = Instant::now();

        let prototypes = self.prototypes(expanded);
        let mut context = GenerationContext::new();
        context.metrics.unterminated = prototypes.unterminated;

        let context = prototypes
            .texts
            .iter()
            .fold(context, |ctx, text| self.process_prototype(ctx, text, docs));

        let source = render_module(&context, &self.config);
        let mut metrics = context.metrics;
        metrics.elapsed = start.elapsed();

        info!("{}", metrics.summary());
        if metrics.unknown_types > 0 {
            warn!("{} parameters of unknown type", metrics.unknown_types);
        }

        Generation { source, metrics }
    }

    /// Plans for every prototype that would get a wrapper
    pub fn analyze(&self, expanded: &str) -> Vec<WrapperPlan> {
        let classifier = Classifier::new(&self.config);

        self.prototypes(expanded)
            .texts
            .iter()
            .filter_map(|text| {
                let signature = split_signature(text).ok()?;
                if self.config.is_excluded(&signature.function_name) {
                    return None;
                }
                let prototype = signature.into_prototype().ok()?;
                classifier.classify(&prototype).ok()
            })
            .collect()
    }

    /// Handle one complete prototype, returning the updated context
    pub fn process_prototype(
        &self,
        context: GenerationContext,
        text: &str,
        docs: &dyn DocSource,
    ) -> GenerationContext {
        let signature = match split_signature(text) {
            Ok(signature) => signature,
            Err(e) => {
                warn!("Skipping prototype: {e}");
                return context.fail();
            }
        };

        if self.config.is_excluded(&signature.function_name) {
            trace!("{} is excluded", signature.function_name);
            return context.exclude();
        }

        let plan = match signature
            .into_prototype()
            .map_err(GenerateError::from)
            .and_then(|prototype| Classifier::new(&self.config).classify(&prototype))
        {
            Ok(plan) => plan,
            Err(e @ GenerateError::Classify(_)) => {
                error!("{e}");
                return context.fail();
            }
            Err(e) => {
                warn!("Skipping prototype: {e}");
                return context.fail();
            }
        };

        let wrapper = WrapperEmitter::new(&self.config).emit(&plan);
        let docstring = docs.docstring(plan.function_name());
        debug!(
            "{} -> {}",
            plan.function_name(),
            wrapper.registration.entry_point
        );

        let mut context = context.accept(wrapper, docstring);
        context.metrics.unknown_types += plan.unknown_types.len();
        context
    }

    fn prototypes(&self, expanded: &str) -> Prototypes {
        let (clean, stats) = neutralize(expanded);
        debug!("header cleanup removed {} items", stats.total());

        let scan = PrototypeScanner::new(&self.config).scan(&clean);
        if let Some(open) = &scan.unterminated {
            warn!("Input ended inside a prototype: {open}");
        }

        Prototypes {
            texts: scan.prototypes,
            unterminated: scan.unterminated.is_some(),
        }
    }
}

struct Prototypes {
    texts: Vec<String>,
    unterminated: bool,
}
