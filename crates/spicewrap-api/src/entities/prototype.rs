use super::parameter::{Marshal, Parameter};
use serde::{Deserialize, Serialize};

/// A native function declaration split into its pieces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prototype {
    /// Return type token, e.g. `SpiceDouble`
    pub return_type: String,

    pub return_is_pointer: bool,

    pub function_name: String,

    /// Raw parameter entries as found between the parentheses
    pub parameters: Vec<String>,

    /// Whitespace-collapsed declaration text
    pub text: String,
}

impl Prototype {
    pub fn new(return_type: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            return_type: return_type.into(),
            return_is_pointer: false,
            function_name: function_name.into(),
            parameters: Vec::new(),
            text: String::new(),
        }
    }

    pub fn returns_void(&self) -> bool {
        self.return_type == "void" && !self.return_is_pointer
    }

    /// The raw parameter list joined back together
    pub fn raw_parameter_list(&self) -> String {
        self.parameters.join(", ")
    }
}

/// How the wrapper hands its outputs back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStrategy {
    /// Every output shape is known when the wrapper is generated
    Automatic,
    /// An output's length is only known after the native call
    Manual {
        /// Output holding the element count of the dynamic output
        count: String,
    },
}

/// A prototype with its parameters classified and a result strategy chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapperPlan {
    pub prototype: Prototype,

    /// Inputs in declaration order
    pub inputs: Vec<Parameter>,

    /// Outputs in declaration order
    pub outputs: Vec<Parameter>,

    /// Marshaling of the native return value
    pub return_marshal: Marshal,

    pub strategy: ResultStrategy,

    /// Inputs fixed to the text buffer length instead of read from the caller
    pub implied_lengths: Vec<String>,

    /// Native types with no marshaling rule seen in this prototype
    pub unknown_types: Vec<String>,
}

impl WrapperPlan {
    pub fn function_name(&self) -> &str {
        &self.prototype.function_name
    }

    pub fn has_allocations(&self) -> bool {
        self.outputs.iter().any(|o| o.allocation_source.is_some())
    }

    pub fn has_text_buffer(&self) -> bool {
        self.outputs.iter().any(Parameter::is_text_buffer)
    }

    pub fn is_implied_length(&self, name: &str) -> bool {
        self.implied_lengths.iter().any(|n| n == name)
    }

    /// Inputs the caller actually supplies, in declaration order
    pub fn retained_inputs(&self) -> impl Iterator<Item = &Parameter> {
        self.inputs
            .iter()
            .filter(|p| !self.is_implied_length(&p.name))
    }

    pub fn output(&self, name: &str) -> Option<&Parameter> {
        self.outputs.iter().find(|o| o.name == name)
    }
}
