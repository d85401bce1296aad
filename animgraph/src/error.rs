use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("graph has no layers")]
    NoLayers,

    #[error("base layer '{layer}' must be an override layer with weight 1")]
    InvalidBaseLayer { layer: String },

    #[error("unknown machine index {index} referenced by {context}")]
    UnknownMachine { context: String, index: usize },

    #[error("unknown state index {index} in machine '{machine}' referenced by {context}")]
    UnknownState {
        machine: String,
        context: String,
        index: usize,
    },

    #[error("unknown clip index {index} referenced by {context}")]
    UnknownClip { context: String, index: usize },

    #[error("unknown mask index {index} referenced by {context}")]
    UnknownMask { context: String, index: usize },

    #[error("unknown parameter {parameter}")]
    UnknownParameter { parameter: String },

    #[error("parameter '{name}' is {actual:?}, expected {expected:?}")]
    ParameterKindMismatch {
        name: String,
        expected: crate::ParameterKind,
        actual: crate::ParameterKind,
    },

    #[error("duplicate parameter '{name}' (id {id:#010x})")]
    DuplicateParameter { name: String, id: u32 },

    #[error("invalid exit transition in machine '{machine}': {message}")]
    InvalidExit { machine: String, message: String },

    #[error("invalid blend tree for state '{state}' in machine '{machine}': {message}")]
    InvalidBlendTree {
        machine: String,
        state: String,
        message: String,
    },

    #[error("sub-machine cycle through machine '{machine}'")]
    MachineCycle { machine: String },

    #[error("sub-machine nesting under '{machine}' exceeds the limit of {limit}")]
    NestingTooDeep { machine: String, limit: usize },

    #[error("invalid layer index: {index}")]
    InvalidLayerIndex { index: usize },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[cfg(feature = "json")]
    #[error("failed to parse JSON: {message}")]
    JsonParse { message: String },

    #[cfg(feature = "json")]
    #[error("failed to write JSON: {message}")]
    JsonWrite { message: String },
}
