pub mod parameter;
pub mod prototype;

pub use parameter::{
    element_refs, nested_tag, Converters, Dimension, Direction, Marshal, Parameter,
};
pub use prototype::{Prototype, ResultStrategy, WrapperPlan};
