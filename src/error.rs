use thiserror::Error;

use crate::value::TypeTag;

/// Errors produced by the engine's checked paths.
///
/// Structural invariant violations (§3) are reported here rather than by
/// aborting the process; evaluation failures raised by a neuron's own
/// function are wrapped in `Eval` and propagate unchanged.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("neuron '{neuron}' expects {expected} children, got {found}")]
    ChildCountMismatch {
        neuron: String,
        expected: usize,
        found: usize,
    },
    #[error("neuron '{neuron}' input {index}: expected type {expected:?}, found {found:?}")]
    TypeMismatch {
        neuron: String,
        index: usize,
        expected: TypeTag,
        found: TypeTag,
    },
    #[error("applyInputs: expected {expected} flattened values, got {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("neuron '{0}' raised during evaluation: {1}")]
    Eval(String, String),
    #[error("unknown type tag '{0}'")]
    UnknownTypeTag(String),
    #[error("unknown neuron '{0}'")]
    UnknownNeuron(String),
    #[error("malformed value literal '{literal}' for type {tag:?}")]
    MalformedValue { literal: String, tag: TypeTag },
    #[error("malformed connection json: {0}")]
    MalformedConnection(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
