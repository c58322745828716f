//! spec.md §8 scenario 4: a named, memorised Connection survives a JSON
//! round trip through a freshly constructed Brain sharing the same neurons.

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
            _ => unreachable!(),
        }
    }
}

#[derive(Debug)]
struct IntToStrFn;
impl NeuronOp for IntToStrFn {
    fn call(&self, args: &[Value]) -> synbrain::EngineResult<Value> {
        match &args[0] {
            Value::Int(i) => Ok(Value::Str(i.to_string())),
            _ => unreachable!(),
        }
    }
}

fn library() -> Vec<Arc<Neuron>> {
    let mut neurons: Vec<Arc<Neuron>> = (0..10)
        .map(|d| Arc::new(Neuron::new(d.to_string(), vec![], TypeTag::Int, ConstOp(Value::Int(d)))))
        .collect();
    neurons.push(Arc::new(Neuron::new("add", vec![TypeTag::Int, TypeTag::Int], TypeTag::Int, AddFn)));
    neurons.push(Arc::new(Neuron::new("intToStr", vec![TypeTag::Int], TypeTag::Str, IntToStrFn)));
    neurons
}

#[test]
fn memorised_named_connection_survives_serialisation_round_trip() {
    let neurons = library();
    let mut brain = Brain::new(neurons.clone());

    let found = brain.learn(&[Value::Str("11".to_string())], 2, 1e-6).unwrap();
    assert_eq!(found.len(), 1);

    let mut named = found.into_iter().next().unwrap();
    named.set_name("addAndStr");
    brain.add_connection(named);

    let json = brain.to_json();
    brain.clear_connections();
    assert!(brain.connections().is_empty());

    let mut reloaded = Brain::new(neurons);
    reloaded.load_json(&json).unwrap();

    assert_eq!(reloaded.connections().len(), 1);
    let restored = &reloaded.connections()[0];
    assert!(restored.string().starts_with("addAndStr("));
    assert_eq!(restored.output().unwrap(), Value::Str("11".to_string()));
}
