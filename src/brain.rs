//! The engine's external interface (spec.md §6): a neuron library plus a
//! memorised connection pool, `learn()` driving enumeration + refinement,
//! and JSON (de)serialisation. Grounded on `original_source/aicpp/include/
//! aicpp/Brain.h` / `src/aicpp/Brain.cpp`.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument};

use crate::connection::Connection;
use crate::enumerator::enumerate;
use crate::error::EngineResult;
use crate::neuron::Neuron;
use crate::refinement::refine;
use crate::value::Value;

/// Default search depth and convergence tolerance (spec.md §6).
pub const DEFAULT_LEVEL: usize = 3;
pub const DEFAULT_EPS: f64 = 1e-6;

pub struct Brain {
    neurons: Vec<Arc<Neuron>>,
    connections: Vec<Connection>,
}

impl Brain {
    pub fn new(neurons: Vec<Arc<Neuron>>) -> Brain {
        Brain { neurons, connections: Vec::new() }
    }

    pub fn neurons(&self) -> &[Arc<Neuron>] {
        &self.neurons
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn add_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub fn remove_connection(&mut self, connection: &Connection) {
        self.connections.retain(|c| c != connection);
    }

    pub fn clear_connections(&mut self) {
        self.connections.clear();
    }

    /// Enumerate skeletons up to `level`, then refine a candidate per target
    /// to within `eps` (spec.md §4.4/§4.5). Empty on failure — "no usable
    /// skeleton" and "empty per-target frontier" are deliberately
    /// indistinguishable (§7).
    #[instrument(skip(self, targets), fields(targets = targets.len(), level, eps))]
    pub fn learn(&self, targets: &[Value], level: usize, eps: f64) -> EngineResult<Vec<Connection>> {
        let enumeration = enumerate(&self.neurons, &self.connections, level)?;
        info!(skeletons = enumeration.skeletons.len(), "enumeration complete");
        let result = refine(&enumeration.skeletons, &enumeration.parameters, targets, eps)?;
        info!(found = result.len(), "refinement complete");
        Ok(result)
    }

    /// `learn` with spec.md §6's defaults (`level = 3`, `eps = 1e-6`).
    pub fn learn_default(&self, targets: &[Value]) -> EngineResult<Vec<Connection>> {
        self.learn(targets, DEFAULT_LEVEL, DEFAULT_EPS)
    }

    /// `{ "neurons": [Neuron], "connections": [Connection] }` (spec.md §6).
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "neurons": self.neurons.iter().map(|n| n.to_json()).collect::<Vec<_>>(),
            "connections": self.connections.iter().map(Connection::to_json).collect::<Vec<_>>(),
        })
    }

    /// Inverse of `to_json`. On any failure — an unrecognised neuron or
    /// type tag anywhere in the payload — the memorised pool is left
    /// cleared and the error is returned (§7).
    pub fn load_json(&mut self, json: &serde_json::Value) -> EngineResult<()> {
        match self.try_load_json(json) {
            Ok(loaded) => {
                self.connections = loaded;
                Ok(())
            }
            Err(e) => {
                self.connections.clear();
                Err(e)
            }
        }
    }

    fn try_load_json(&self, json: &serde_json::Value) -> EngineResult<Vec<Connection>> {
        let connections = json
            .get("connections")
            .and_then(|v| v.as_array())
            .ok_or_else(|| crate::error::EngineError::MalformedConnection("missing 'connections'".to_string()))?;
        connections
            .iter()
            .map(|c| Connection::from_json(c, &self.neurons))
            .collect()
    }
}
