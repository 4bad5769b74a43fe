//! Parameter classification
//!
//! Turns a parsed [`Prototype`] into a [`WrapperPlan`]: every raw parameter
//! entry is split into type, constness, pointer-ness and array dimensions,
//! given a direction and a marshaling family, and sorted into the input or
//! output list.
//!
//! Direction rules, first match wins:
//!
//! 1. non-const array → output
//! 2. const, or not a pointer → input
//! 3. pointer → output
//!
//! After each parameter a one-step lookback applies: an input directly
//! following an output moves that output to the inputs. A pointer that was
//! read as a return slot but is followed by another input is a plain bound.
//! Only the immediately preceding parameter is reconsidered.

use log::{trace, warn};
use regex::Regex;
use spicewrap_api::{
    ClassifyError, Converters, Dimension, Direction, GenerateResult, GeneratorConfig, Marshal,
    Parameter, ParseError, Prototype, ResultStrategy, WrapperPlan,
};
use std::sync::LazyLock;

use crate::parser::collapse_whitespace;

static RE_DIMENSION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]").unwrap());

/// Marshaling family and converters for a native type name.
///
/// Returns `None` for types the generator has no rule for.
pub fn marshal_for(c_type: &str) -> Option<(Marshal, Option<Converters>)> {
    let object = |class: &str, suffix: &str| {
        Some((
            Marshal::Object,
            Some(Converters::new(
                class,
                format!("get_spice_{suffix}"),
                format!("get_py_{suffix}"),
            )),
        ))
    };

    match c_type {
        "SpiceChar" | "ConstSpiceChar" => Some((Marshal::Text, None)),
        "SpiceDouble" | "ConstSpiceDouble" => Some((Marshal::Double, None)),
        "SpiceBoolean" | "ConstSpiceBoolean" => Some((Marshal::Boolean, None)),
        "SpiceInt" | "ConstSpiceInt" => Some((Marshal::Integer, None)),
        "SpiceCell" => object("Cell", "cell"),
        "SpiceEllipse" | "ConstSpiceEllipse" => object("Ellipse", "ellipse"),
        "SpiceEKAttDsc" => object("EkAttDsc", "ekattdsc"),
        "SpiceEKSegSum" => object("EkSegSum", "eksegsum"),
        "SpicePlane" | "ConstSpicePlane" => object("Plane", "plane"),
        "void" => Some((Marshal::Empty, None)),
        _ => None,
    }
}

/// Split one raw parameter entry.
///
/// Returns `Ok(None)` for a bare `void` entry. The direction is left at its
/// default and the marshaling family is not assigned yet.
pub fn parse_parameter(
    entry: &str,
    function: &str,
    config: &GeneratorConfig,
) -> Result<Option<Parameter>, ParseError> {
    let entry = collapse_whitespace(entry);
    let mut tokens = entry.split(' ').peekable();

    let mut is_const = false;
    if tokens.peek() == Some(&"const") {
        is_const = true;
        tokens.next();
    }

    let mut c_type = tokens.next().unwrap_or_default().to_string();
    let mut is_pointer = false;
    if let Some(stripped) = c_type.strip_suffix('*') {
        c_type = stripped.to_string();
        is_pointer = true;
    }

    let mut name = match tokens.next() {
        Some("*") => {
            is_pointer = true;
            tokens.next()
        }
        other => other,
    };

    if let Some(fused) = name.and_then(|n| n.strip_prefix('*')) {
        is_pointer = true;
        name = Some(fused);
    }

    // A bracket stuck to the name is part of the dimensions
    let name = name
        .map(|n| n.split('[').next().unwrap_or_default())
        .filter(|n| !n.is_empty());

    let Some(name) = name else {
        if c_type == "void" {
            return Ok(None);
        }
        return Err(ParseError::UnnamedParameter {
            function: function.to_string(),
            entry,
        });
    };

    if c_type.starts_with("Const") {
        is_const = true;
    }

    let dimensions = RE_DIMENSION
        .captures_iter(&entry)
        .map(|cap| {
            let text = cap[1].trim();
            if text.is_empty() {
                Ok(Dimension::Unknown)
            } else {
                match text.parse::<usize>() {
                    Ok(count) if count > 0 => Ok(Dimension::Fixed(count)),
                    _ => Err(ParseError::BadDimension {
                        entry: entry.clone(),
                        text: text.to_string(),
                    }),
                }
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut param = Parameter::new(config.rename(name), c_type).with_dimensions(dimensions);
    param.is_const = is_const;
    param.is_pointer = is_pointer;
    param.original = entry;

    Ok(Some(param))
}

/// Direction of a parameter by the fixed rule order
pub fn direction_of(param: &Parameter) -> Option<Direction> {
    if param.is_array() && !param.is_const {
        Some(Direction::Output)
    } else if param.is_const || !param.is_pointer {
        Some(Direction::Input)
    } else if param.is_pointer {
        Some(Direction::Output)
    } else {
        None
    }
}

/// Classifies prototypes against one configuration
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Build the wrapper plan for one prototype
    pub fn classify(&self, prototype: &Prototype) -> GenerateResult<WrapperPlan> {
        let function = prototype.function_name.as_str();
        let mut inputs: Vec<Parameter> = Vec::new();
        let mut outputs: Vec<Parameter> = Vec::new();
        let mut unknown_types = Vec::new();
        let mut last = None;

        for entry in &prototype.parameters {
            let Some(mut param) = parse_parameter(entry, function, self.config)? else {
                continue;
            };

            match marshal_for(&param.c_type) {
                Some((marshal, converters)) => {
                    param.marshal = marshal;
                    param.converters = converters;
                }
                None => {
                    warn!("Unknown type: {} ({function})", param.c_type);
                    unknown_types.push(param.c_type.clone());
                }
            }

            let direction =
                direction_of(&param).ok_or_else(|| ClassifyError::UnknownDirection {
                    function: function.to_string(),
                    parameter: param.name.clone(),
                })?;
            param.direction = direction;

            if direction == Direction::Input && last == Some(Direction::Output) {
                if let Some(mut previous) = outputs.pop() {
                    trace!("{function}: {} reclassified as input", previous.name);
                    previous.direction = Direction::Input;
                    inputs.push(previous);
                }
            }
            last = Some(direction);

            trace!("{function}: {} {:?} {:?}", param.name, direction, param.marshal);
            match direction {
                Direction::Input => inputs.push(param),
                Direction::Output => outputs.push(param),
            }
        }

        let strategy = self.apply_override(function, &inputs, &mut outputs)?;

        for param in inputs.iter().chain(outputs.iter()) {
            self.check_shape(function, param)?;
        }

        let implied_lengths = if outputs.iter().any(Parameter::is_text_buffer) {
            inputs
                .iter()
                .filter(|p| p.name.contains(self.config.length_marker.as_str()))
                .map(|p| p.name.clone())
                .collect()
        } else {
            Vec::new()
        };

        let return_marshal = self.return_marshal(prototype, outputs.is_empty())?;

        Ok(WrapperPlan {
            prototype: prototype.clone(),
            inputs,
            outputs,
            return_marshal,
            strategy,
            implied_lengths,
            unknown_types,
        })
    }

    fn apply_override(
        &self,
        function: &str,
        inputs: &[Parameter],
        outputs: &mut [Parameter],
    ) -> Result<ResultStrategy, ClassifyError> {
        let Some(rule) = self.config.manual_override(function) else {
            return Ok(ResultStrategy::Automatic);
        };

        let missing = |name: &str| ClassifyError::MissingOverrideTarget {
            function: function.to_string(),
            name: name.to_string(),
        };

        if !inputs.iter().any(|p| p.name == rule.allocate_from) {
            return Err(missing(&rule.allocate_from));
        }
        if !outputs.iter().any(|p| p.name == rule.count) {
            return Err(missing(&rule.count));
        }
        let target = outputs
            .iter_mut()
            .find(|p| p.name == rule.output)
            .ok_or_else(|| missing(&rule.output))?;
        target.allocation_source = Some(rule.allocate_from.clone());

        Ok(ResultStrategy::Manual {
            count: rule.count.clone(),
        })
    }

    fn check_shape(&self, function: &str, param: &Parameter) -> Result<(), ClassifyError> {
        if param.is_text() {
            if param.dimensions.len() > 1 {
                return Err(ClassifyError::UnsupportedArray {
                    function: function.to_string(),
                    parameter: param.name.clone(),
                });
            }
            return Ok(());
        }

        if param.is_array()
            && param.fixed_dimensions().is_none()
            && param.allocation_source.is_none()
        {
            return Err(ClassifyError::UnsizedArray {
                function: function.to_string(),
                parameter: param.name.clone(),
            });
        }

        Ok(())
    }

    fn return_marshal(
        &self,
        prototype: &Prototype,
        no_outputs: bool,
    ) -> Result<Marshal, ClassifyError> {
        if prototype.returns_void() {
            return Ok(Marshal::Empty);
        }

        let unsupported = || ClassifyError::UnsupportedReturn {
            function: prototype.function_name.clone(),
            return_type: if prototype.return_is_pointer {
                format!("{} *", prototype.return_type)
            } else {
                prototype.return_type.clone()
            },
        };

        let marshal = match marshal_for(&prototype.return_type) {
            Some((marshal, None)) if marshal != Marshal::Empty => marshal,
            _ if no_outputs => return Err(unsupported()),
            _ => Marshal::Empty,
        };

        // Only text may come back through a pointer
        if prototype.return_is_pointer && marshal != Marshal::Text && no_outputs {
            return Err(unsupported());
        }

        Ok(marshal)
    }
}
