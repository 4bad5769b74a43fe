use serde::{Deserialize, Serialize};

/// Whether a parameter is supplied by the caller or returned to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

/// Size of one array dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Fixed(usize),
    /// Empty brackets; the size comes from another parameter
    Unknown,
}

impl Dimension {
    pub fn fixed(&self) -> Option<usize> {
        match self {
            Dimension::Fixed(n) => Some(*n),
            Dimension::Unknown => None,
        }
    }
}

/// Marshaling family of a native type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marshal {
    Text,
    Double,
    Boolean,
    Integer,
    /// Opaque aggregate converted through a function pair
    Object,
    Empty,
}

impl Marshal {
    /// Format code used by the host's argument parser and value builder
    pub fn code(&self) -> &'static str {
        match self {
            Marshal::Text => "s",
            Marshal::Double => "d",
            Marshal::Boolean => "i",
            Marshal::Integer => "l",
            Marshal::Object => "O",
            Marshal::Empty => "",
        }
    }

    /// C storage type the host writes into; `None` keeps the native type
    pub fn storage(&self) -> Option<&'static str> {
        match self {
            Marshal::Text => Some("char"),
            Marshal::Double => Some("double"),
            Marshal::Boolean => Some("int"),
            Marshal::Integer => Some("long"),
            Marshal::Object | Marshal::Empty => None,
        }
    }

    /// Expression handed to the value builder for `expr`.
    ///
    /// Integers are widened so the variadic argument matches the `l` code.
    pub fn host_value(&self, expr: &str) -> String {
        match self {
            Marshal::Integer => format!("(long) {expr}"),
            _ => expr.to_string(),
        }
    }
}

/// Host→native and native→host converter functions for an opaque type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Converters {
    /// Host class name mirroring the native record
    pub class: String,
    pub to_native: String,
    pub to_host: String,
}

impl Converters {
    pub fn new(
        class: impl Into<String>,
        to_native: impl Into<String>,
        to_host: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            to_native: to_native.into(),
            to_host: to_host.into(),
        }
    }
}

/// One classified parameter of a native prototype
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    /// Name after reserved-name renaming
    pub name: String,

    /// Native type token, e.g. `ConstSpiceChar`
    pub c_type: String,

    pub is_const: bool,

    pub is_pointer: bool,

    /// Array dimensions in declaration order
    pub dimensions: Vec<Dimension>,

    pub direction: Direction,

    pub marshal: Marshal,

    pub converters: Option<Converters>,

    /// Sibling parameter whose value sizes a dynamic allocation
    pub allocation_source: Option<String>,

    /// Entry text as it appeared in the prototype
    pub original: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, c_type: impl Into<String>) -> Self {
        let c_type = c_type.into();
        Self {
            name: name.into(),
            original: c_type.clone(),
            c_type,
            is_const: false,
            is_pointer: false,
            dimensions: Vec::new(),
            direction: Direction::Input,
            marshal: Marshal::Empty,
            converters: None,
            allocation_source: None,
        }
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn pointer(mut self) -> Self {
        self.is_pointer = true;
        self
    }

    pub fn with_dimensions(mut self, dimensions: Vec<Dimension>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_marshal(mut self, marshal: Marshal) -> Self {
        self.marshal = marshal;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_converters(mut self, converters: Converters) -> Self {
        self.converters = Some(converters);
        self
    }

    pub fn with_allocation_source(mut self, source: impl Into<String>) -> Self {
        self.allocation_source = Some(source.into());
        self
    }

    pub fn is_array(&self) -> bool {
        !self.dimensions.is_empty()
    }

    pub fn is_input(&self) -> bool {
        self.direction == Direction::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }

    pub fn is_text(&self) -> bool {
        self.marshal == Marshal::Text
    }

    /// Text output the native library fills into a fixed-length buffer
    pub fn is_text_buffer(&self) -> bool {
        self.is_output() && self.is_text() && self.dimensions.len() <= 1
    }

    /// Array whose elements are marshaled one by one
    pub fn is_element_array(&self) -> bool {
        self.is_array() && !self.is_text()
    }

    /// Concrete dimensions, or `None` if any is unknown
    pub fn fixed_dimensions(&self) -> Option<Vec<usize>> {
        self.dimensions.iter().map(Dimension::fixed).collect()
    }

    /// Format directive for this parameter.
    ///
    /// Arrays nest one group per dimension, so `[3][3]` of doubles becomes
    /// `((ddd)(ddd)(ddd))`.
    pub fn format_tag(&self) -> String {
        let leaf = self.marshal.code();
        if !self.is_element_array() {
            return leaf.to_string();
        }
        match self.fixed_dimensions() {
            Some(dims) => nested_tag(&dims, leaf),
            None => leaf.to_string(),
        }
    }

    /// Row-major element references for a fixed-size array, e.g. `m[0][1]`
    pub fn element_refs(&self) -> Vec<String> {
        match self.fixed_dimensions() {
            Some(dims) if self.is_element_array() => element_refs(&self.name, &dims),
            _ => vec![self.name.clone()],
        }
    }
}

/// Build a nested grouping of `leaf` codes matching `dims`
pub fn nested_tag(dims: &[usize], leaf: &str) -> String {
    match dims.split_first() {
        None => leaf.to_string(),
        Some((count, rest)) => {
            let inner = nested_tag(rest, leaf);
            let mut tag = String::with_capacity(2 + inner.len() * count);
            tag.push('(');
            for _ in 0..*count {
                tag.push_str(&inner);
            }
            tag.push(')');
            tag
        }
    }
}

/// Expand every index of an array with the given dimensions, row-major
pub fn element_refs(name: &str, dims: &[usize]) -> Vec<String> {
    let mut refs = vec![name.to_string()];
    for &dim in dims {
        refs = refs
            .iter()
            .flat_map(|prefix| (0..dim).map(move |i| format!("{prefix}[{i}]")))
            .collect();
    }
    refs
}
