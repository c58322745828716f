//! spec.md §8 scenario 6: inferring a colour mapping from training pairs and
//! applying it to a separate grid-vector input.

use std::collections::BTreeMap;
use std::sync::Arc;

use ndarray::Array2;
use synbrain::{Brain, Grid, Neuron, NeuronOp, TypeTag, Value};

fn grid(rows: &[&[i64]]) -> Grid {
    let ncols = rows[0].len();
    let flat: Vec<i64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Array2::from_shape_vec((rows.len(), ncols), flat).unwrap()
}

fn recolour(g: &Grid, mapping: &BTreeMap<i64, i64>) -> Grid {
    g.map(|v| *mapping.get(v).unwrap_or(v))
}

#[derive(Debug, Clone)]
struct ConstOp(Value);
impl NeuronOp for ConstOp {
    fn call(&self, _args: &[Value]) -> synbrain::EngineResult<Value> {
        Ok(self.0.clone())
    }
}

#[derive(Debug)]
struct InferColorMappingFn;
impl NeuronOp for InferColorMappingFn {
    fn call(&self, args: &[Value]) -> synbrain::EngineResult<Value> {
        match &args[0] {
            Value::GridPairVec(pairs) => {
                let mut mapping = BTreeMap::new();
                for (input, output) in pairs {
                    for (a, b) in input.iter().zip(output.iter()) {
                        mapping.entry(*a).or_insert(*b);
                    }
                }
                Ok(Value::IntIntMap(mapping))
            }
            _ => unreachable!(),
        }
    }
}

#[derive(Debug)]
struct MapFn;
impl NeuronOp for MapFn {
    fn call(&self, args: &[Value]) -> synbrain::EngineResult<Value> {
        match (&args[0], &args[1]) {
            (Value::GridVec(grids), Value::IntIntMap(mapping)) => {
                Ok(Value::GridVec(grids.iter().map(|g| recolour(g, mapping)).collect()))
            }
            _ => unreachable!(),
        }
    }
}

#[test]
fn colour_mapping_inferred_from_pairs_recolours_input() {
    let train_in = grid(&[&[1, 2], &[2, 1]]);
    let train_out = grid(&[&[9, 8], &[8, 9]]);

    let train_pairs_neuron = Arc::new(Neuron::new(
        "trainPairs",
        vec![],
        TypeTag::GridPairVec,
        ConstOp(Value::GridPairVec(vec![(train_in.clone(), train_out.clone())])),
    ));
    let input_neuron = Arc::new(Neuron::new(
        "input",
        vec![],
        TypeTag::GridVec,
        ConstOp(Value::GridVec(vec![train_in.clone()])),
    ));
    let infer_neuron = Arc::new(Neuron::new(
        "inferColorMapping",
        vec![TypeTag::GridPairVec],
        TypeTag::IntIntMap,
        InferColorMappingFn,
    ));
    let map_neuron = Arc::new(Neuron::new(
        "map",
        vec![TypeTag::GridVec, TypeTag::IntIntMap],
        TypeTag::GridVec,
        MapFn,
    ));

    let brain = Brain::new(vec![train_pairs_neuron, input_neuron, infer_neuron, map_neuron]);

    let target = Value::GridVec(vec![train_out]);
    let found = brain.learn(&[target.clone()], 2, 1e-6).unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(synbrain::heuristic::h(&found[0].output().unwrap(), &target), 0.0);
    assert!(found[0].string().contains("map("));
}
