//! Thin marshalling layer between a foreign language runtime and
//! [`synbrain`]: translate a JSON target list into `Value`s, drive
//! `Brain::learn`, and serialise the resulting Connections back to JSON.
//!
//! Building real [`synbrain::NeuronOp`] implementations from a bare neuron
//! name is the out-of-scope "primitive operator library" collaborator
//! (spec.md §1/§6): this crate assumes the embedder has already constructed
//! a [`synbrain::Brain`] with genuine operators and only marshals target
//! values and results across the boundary.

use synbrain::{Brain, Connection, EngineError, TypeTag, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BindingError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("malformed target json: {0}")]
    MalformedTarget(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a JSON array of `{"type": tagName, "value": lexicalForm}` objects
/// into `Value`s, using the same lexical encoding as a Connection's leaf
/// inputs (spec.md §6).
pub fn targets_from_json(targets_json: &str) -> Result<Vec<Value>, BindingError> {
    let parsed: serde_json::Value = serde_json::from_str(targets_json)?;
    let array = parsed
        .as_array()
        .ok_or_else(|| BindingError::MalformedTarget("expected a JSON array of targets".to_string()))?;

    array
        .iter()
        .map(|entry| {
            let obj = entry
                .as_object()
                .ok_or_else(|| BindingError::MalformedTarget("expected a target object".to_string()))?;
            let tag_name = obj
                .get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| BindingError::MalformedTarget("missing 'type'".to_string()))?;
            let literal = obj
                .get("value")
                .and_then(|v| v.as_str())
                .ok_or_else(|| BindingError::MalformedTarget("missing 'value'".to_string()))?;
            let tag = TypeTag::from_name(tag_name)?;
            Ok(Value::parse_leaf(tag, literal)?)
        })
        .collect()
}

/// Drive `brain.learn(targets, level, eps)` from a JSON target list and
/// serialise the resulting Connections (one per target, in order, or an
/// empty array on failure) per spec.md §6's Connection schema.
pub fn learn_json(brain: &Brain, targets_json: &str, level: usize, eps: f64) -> Result<String, BindingError> {
    let targets = targets_from_json(targets_json)?;
    let connections = brain.learn(&targets, level, eps)?;
    let json: Vec<serde_json::Value> = connections.iter().map(Connection::to_json).collect();
    Ok(serde_json::to_string(&json)?)
}
