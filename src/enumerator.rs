//! Bottom-up, level-bounded enumeration of well-typed expression skeletons
//! (spec.md §4.4), grounded on `original_source/aicpp/src/aicpp/Brain.cpp`'s
//! substitution loop inside `learn()`.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::connection::Connection;
use crate::error::EngineResult;
use crate::neuron::Neuron;
use crate::odometer::Odometer;
use crate::value::{TypeTag, Value};

/// The deduplicated skeleton set plus the per-tag leaf pool used to seed it
/// — the latter is reused verbatim by the refinement engine's Phase A.
pub struct Enumeration {
    pub skeletons: Vec<Connection>,
    pub parameters: HashMap<TypeTag, Vec<Value>>,
}

/// Run the enumeration algorithm of spec.md §4.4 over `neurons`, seeding the
/// leaf pool with `memorised` Connections that have no remaining holes and
/// adding the rest directly to the working skeleton set.
#[tracing::instrument(skip(neurons, memorised))]
pub fn enumerate(neurons: &[Arc<Neuron>], memorised: &[Connection], level: usize) -> EngineResult<Enumeration> {
    let mut parameters: HashMap<TypeTag, Vec<Value>> = HashMap::new();
    let mut connections: Vec<Connection> = Vec::new();

    for neuron in neurons.iter().filter(|n| n.is_leaf()) {
        let leaf = Connection::make(neuron.clone(), vec![])?;
        parameters.entry(neuron.output()).or_default().push(Value::Conn(Box::new(leaf)));
    }
    for memo in memorised {
        if memo.input_types().is_empty() {
            parameters
                .entry(memo.neuron().output())
                .or_default()
                .push(Value::Conn(Box::new(memo.clone())));
        } else {
            connections.push(memo.clone());
        }
    }

    for neuron in neurons.iter().filter(|n| !n.is_leaf()) {
        let children = neuron.inputs().iter().map(|t| Value::Placeholder(*t)).collect();
        connections.push(Connection::make(neuron.clone(), children)?);
    }

    debug!(leaves = parameters.values().map(Vec::len).sum::<usize>(), operators = connections.len(), "seeded enumerator");

    let mut accumulated: HashMap<TypeTag, Vec<Value>> = parameters.clone();

    for pass in 0..level {
        let mut mapping: HashMap<TypeTag, Vec<Connection>> = HashMap::new();
        let mut seen: HashSet<Connection> = HashSet::new();

        for c in &connections {
            let pools: Vec<Vec<Value>> = c
                .input_types()
                .into_iter()
                .map(|t| {
                    let mut pool = vec![Value::Placeholder(t)];
                    if let Some(extra) = accumulated.get(&t) {
                        pool.extend(extra.iter().cloned());
                    }
                    pool
                })
                .collect();

            for tuple in Odometer::new(pools).drain() {
                let mut candidate = c.clone();
                candidate.apply_inputs(tuple)?;
                if seen.insert(candidate.clone()) {
                    mapping.entry(candidate.neuron().output()).or_default().push(candidate);
                }
            }
        }

        debug!(pass, produced = mapping.values().map(Vec::len).sum::<usize>(), "enumerator pass complete");

        connections = mapping.values().flatten().cloned().collect();
        accumulated = mapping
            .into_iter()
            .map(|(tag, conns)| (tag, conns.into_iter().map(|c| Value::Conn(Box::new(c))).collect()))
            .collect();
    }

    for leaves in parameters.values() {
        for leaf in leaves {
            if let Value::Conn(c) = leaf {
                connections.push((**c).clone());
            }
        }
    }

    let mut dedup: HashSet<Connection> = HashSet::new();
    connections.retain(|c| dedup.insert(c.clone()));
    connections.sort_by(|a, b| a.cost().cmp(&b.cost()).then_with(|| a.expression().cmp(&b.expression())));

    Ok(Enumeration {
        skeletons: connections,
        parameters,
    })
}
