//! spec.md §8 scenarios 1-3: arithmetic synthesis, composition, and
//! cross-type coercion.

use std::sync::Arc;

use synbrain::{Brain, Neuron, NeuronOp, TypeTag, Value};

#[derive(Debug, Clone)]
struct ConstOp(Value);
impl NeuronOp for ConstOp {
    fn call(&self, _args: &[Value]) -> synbrain::EngineResult<Value> {
        Ok(self.0.clone())
    }
}

#[derive(Debug)]
struct AddFn;
impl NeuronOp for AddFn {
    fn call(&self, args: &[Value]) -> synbrain::EngineResult<Value> {
        match (&args[0], &args[1]) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a + b)),
            _ => unreachable!("applyInputs guarantees declared tags"),
        }
    }
}

#[derive(Debug)]
struct MulFn;
impl NeuronOp for MulFn {
    fn call(&self, args: &[Value]) -> synbrain::EngineResult<Value> {
        match (&args[0], &args[1]) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a * b)),
            _ => unreachable!("applyInputs guarantees declared tags"),
        }
    }
}

#[derive(Debug)]
struct IntToStrFn;
impl NeuronOp for IntToStrFn {
    fn call(&self, args: &[Value]) -> synbrain::EngineResult<Value> {
        match &args[0] {
            Value::Int(i) => Ok(Value::Str(i.to_string())),
            _ => unreachable!("applyInputs guarantees declared tags"),
        }
    }
}

fn digit_neurons() -> Vec<Arc<Neuron>> {
    (0..10)
        .map(|d| Arc::new(Neuron::new(d.to_string(), vec![], TypeTag::Int, ConstOp(Value::Int(d)))))
        .collect()
}

#[test]
fn arithmetic_synthesis_of_five() {
    let mut neurons = digit_neurons();
    neurons.push(Arc::new(Neuron::new("add", vec![TypeTag::Int, TypeTag::Int], TypeTag::Int, AddFn)));
    let brain = Brain::new(neurons);

    let result = brain.learn(&[Value::Int(5)], 1, 1e-6).unwrap();
    assert_eq!(result.len(), 1);
    let found = &result[0];
    assert_eq!(found.output().unwrap(), Value::Int(5));
    assert!(found.cost() >= 2);
    assert_eq!(synbrain::heuristic::h(&found.output().unwrap(), &Value::Int(5)), 0.0);
}

#[test]
fn composition_reaches_twenty() {
    let mut neurons = digit_neurons();
    neurons.push(Arc::new(Neuron::new("add", vec![TypeTag::Int, TypeTag::Int], TypeTag::Int, AddFn)));
    neurons.push(Arc::new(Neuron::new("mul", vec![TypeTag::Int, TypeTag::Int], TypeTag::Int, MulFn)));
    let brain = Brain::new(neurons);

    let result = brain.learn(&[Value::Int(20)], 2, 1e-6).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].output().unwrap(), Value::Int(20));
}

#[test]
fn cross_type_coercion_to_string_eleven() {
    let mut neurons = digit_neurons();
    neurons.push(Arc::new(Neuron::new("add", vec![TypeTag::Int, TypeTag::Int], TypeTag::Int, AddFn)));
    neurons.push(Arc::new(Neuron::new("intToStr", vec![TypeTag::Int], TypeTag::Str, IntToStrFn)));
    let brain = Brain::new(neurons);

    let result = brain.learn(&[Value::Str("11".to_string())], 2, 1e-6).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].output().unwrap(), Value::Str("11".to_string()));
}

#[test]
fn empty_neuron_library_yields_empty_result() {
    let brain = Brain::new(vec![]);
    let result = brain.learn(&[Value::Int(5)], 3, 1e-6).unwrap();
    assert!(result.is_empty());
}

#[test]
fn level_zero_succeeds_only_when_a_leaf_already_matches() {
    let neurons = digit_neurons();
    let brain = Brain::new(neurons);

    let hit = brain.learn(&[Value::Int(5)], 0, 1e-6).unwrap();
    assert_eq!(hit.len(), 1);
    assert_eq!(hit[0].output().unwrap(), Value::Int(5));

    let miss = brain.learn(&[Value::Int(42)], 0, 1e-6).unwrap();
    assert_eq!(miss.len(), 1, "level=0 still returns the best available leaf, just not an exact match");
    assert_ne!(miss[0].output().unwrap(), Value::Int(42));
}
