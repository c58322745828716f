use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::EngineResult;
use crate::value::{TypeTag, Value};

/// The pure function a [`Neuron`] wraps. Implementations must be
/// deterministic and side-effect-free, and must accept exactly the number
/// and tags of arguments declared by the owning neuron's `inputs`.
pub trait NeuronOp: Send + Sync + fmt::Debug {
    fn call(&self, args: &[Value]) -> EngineResult<Value>;
}

/// A named pure typed function used as an operator in expressions (§3, §4.2).
///
/// Leaf neurons (empty `inputs`) are the engine's parameters/constants;
/// operator neurons combine already-produced values.
pub struct Neuron {
    name: String,
    inputs: Vec<TypeTag>,
    pub output: TypeTag,
    op: Box<dyn NeuronOp>,
}

impl fmt::Debug for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neuron")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish()
    }
}

impl Neuron {
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<TypeTag>,
        output: TypeTag,
        op: impl NeuronOp + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            inputs,
            output,
            op: Box::new(op),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[TypeTag] {
        &self.inputs
    }

    pub fn output(&self) -> TypeTag {
        self.output
    }

    pub fn is_leaf(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn call(&self, args: &[Value]) -> EngineResult<Value> {
        self.op.call(args)
    }

    /// `name` + each input tag + output tag, combined — the neuron half of
    /// a Connection's structural hash (§3).
    pub fn structural_hash(&self) -> u64 {
        let mut h = DefaultHasher::new();
        self.name.hash(&mut h);
        for t in &self.inputs {
            t.hash(&mut h);
        }
        self.output.hash(&mut h);
        h.finish()
    }

    /// `{ name, inputTypes, outputType }` per spec.md §6 — deliberately
    /// carries no trace of `op`, since a neuron's function is never
    /// serialised.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "inputTypes": self.inputs.iter().map(|t| t.name()).collect::<Vec<_>>(),
            "outputType": self.output.name(),
        })
    }
}

/// A leaf [`NeuronOp`] returning a fixed constant, used for the digit/bool
/// literal neurons typical of a small arithmetic library.
#[derive(Debug, Clone)]
pub struct ConstOp(pub Value);

impl NeuronOp for ConstOp {
    fn call(&self, _args: &[Value]) -> EngineResult<Value> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_neuron_has_no_inputs() {
        let n = Neuron::new("five", vec![], TypeTag::Int, ConstOp(Value::Int(5)));
        assert!(n.is_leaf());
        assert_eq!(n.call(&[]).unwrap(), Value::Int(5));
    }

    #[test]
    fn structural_hash_is_stable_for_equal_signatures() {
        let a = Neuron::new("add", vec![TypeTag::Int, TypeTag::Int], TypeTag::Int, ConstOp(Value::Int(0)));
        let b = Neuron::new("add", vec![TypeTag::Int, TypeTag::Int], TypeTag::Int, ConstOp(Value::Int(1)));
        assert_eq!(a.structural_hash(), b.structural_hash());
    }
}
