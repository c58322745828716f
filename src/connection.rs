use std::sync::Arc;

use serde_json::json;

use crate::error::{EngineError, EngineResult};
use crate::neuron::Neuron;
use crate::value::{value_hash, TypeTag, Value};

/// A typed expression tree node: a neuron plus its children, each either a
/// nested `Connection`, a constant `Value`, or a type placeholder (§3, §4.3).
#[derive(Clone)]
pub struct Connection {
    neuron: Arc<Neuron>,
    children: Vec<Value>,
    name: Option<String>,
    source: Option<Box<Connection>>,
    hash: u64,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Connection").field(&self.expression()).finish()
    }
}

impl Connection {
    /// Construct a Connection, enforcing the structural invariants of §3:
    /// child count matches the neuron's arity, and each child's effective
    /// tag matches the corresponding declared input tag.
    pub fn make(neuron: Arc<Neuron>, children: Vec<Value>) -> EngineResult<Connection> {
        if children.len() != neuron.inputs().len() {
            return Err(EngineError::ChildCountMismatch {
                neuron: neuron.name().to_string(),
                expected: neuron.inputs().len(),
                found: children.len(),
            });
        }
        for (i, (child, expected)) in children.iter().zip(neuron.inputs()).enumerate() {
            let found = child.tag();
            if found != *expected {
                return Err(EngineError::TypeMismatch {
                    neuron: neuron.name().to_string(),
                    index: i,
                    expected: *expected,
                    found,
                });
            }
        }
        let mut c = Connection {
            neuron,
            children,
            name: None,
            source: None,
            hash: 0,
        };
        c.hash = c.compute_hash();
        Ok(c)
    }

    pub fn neuron(&self) -> &Neuron {
        &self.neuron
    }

    pub fn neuron_arc(&self) -> &Arc<Neuron> {
        &self.neuron
    }

    pub fn children(&self) -> &[Value] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of edges in the subtree; a leaf Connection has cost 0 (§3).
    pub fn cost(&self) -> usize {
        self.children
            .iter()
            .map(|c| match c {
                Value::Conn(inner) => 1 + inner.cost(),
                _ => 1,
            })
            .sum()
    }

    /// Longest chain of nested Connections below this one (§3).
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .filter_map(|c| c.as_connection())
            .map(|inner| 1 + inner.depth())
            .max()
            .unwrap_or(0)
    }

    /// Flat left-to-right sequence of leaf placeholder/value tags (§3).
    pub fn input_types(&self) -> Vec<TypeTag> {
        let mut types = Vec::new();
        for child in &self.children {
            match child {
                Value::Conn(inner) => {
                    let inner_types = inner.input_types();
                    if inner_types.is_empty() {
                        types.push(inner.neuron().output());
                    } else {
                        types.extend(inner_types);
                    }
                }
                other => types.push(other.tag()),
            }
        }
        types
    }

    /// Flat left-to-right sequence of leaf Values (§3). Mirrors
    /// `input_types`'s branching: a nested Connection with no further holes
    /// is itself the leaf (e.g. a 0-arity leaf-neuron Connection), not a
    /// container to recurse past.
    pub fn leaf_inputs(&self) -> Vec<Value> {
        let mut out = Vec::new();
        for child in &self.children {
            match child {
                Value::Conn(inner) => {
                    if inner.input_types().is_empty() {
                        out.push(child.clone());
                    } else {
                        out.extend(inner.leaf_inputs());
                    }
                }
                other => out.push(other.clone()),
            }
        }
        out
    }

    /// Recursively evaluate. Only defined once every placeholder has been
    /// resolved by `apply_inputs`; a remaining placeholder is a programmer
    /// error (§4.3).
    pub fn output(&self) -> EngineResult<Value> {
        let mut args = Vec::with_capacity(self.children.len());
        for child in &self.children {
            match child {
                Value::Conn(inner) => args.push(inner.output()?),
                Value::Placeholder(t) => {
                    return Err(EngineError::MalformedValue {
                        literal: "<unresolved placeholder>".to_string(),
                        tag: *t,
                    })
                }
                other => args.push(other.clone()),
            }
        }
        self.neuron
            .call(&args)
            .map_err(|e| EngineError::Eval(self.neuron.name().to_string(), e.to_string()))
    }

    /// Substitute, left-to-right, the next entry of `flat` into every
    /// placeholder, descending into Connection children. Each Connection
    /// child consumes exactly its own `input_types().len()` entries; a
    /// Connection child with no remaining holes is replaced wholesale by
    /// the next entry (§4.3).
    pub fn apply_inputs(&mut self, flat: Vec<Value>) -> EngineResult<()> {
        let expected = self.input_types().len();
        if flat.len() != expected {
            return Err(EngineError::ArityMismatch {
                expected,
                found: flat.len(),
            });
        }

        let mut index = 0usize;
        for child in self.children.iter_mut() {
            match child {
                Value::Conn(inner) => {
                    let size = inner.input_types().len();
                    if size > 0 {
                        let slice = flat[index..index + size].to_vec();
                        inner.apply_inputs(slice)?;
                        index += size;
                    } else if index < flat.len() {
                        *child = flat[index].clone();
                        index += 1;
                    }
                }
                _ => {
                    if index < flat.len() {
                        *child = flat[index].clone();
                        index += 1;
                    }
                }
            }
        }

        self.hash = self.compute_hash();
        Ok(())
    }

    /// Canonical prefix textual form, e.g. `add(2, 3)`.
    pub fn expression(&self) -> String {
        let mut s = self.neuron.name().to_string();
        if !self.neuron.inputs().is_empty() {
            let args: Vec<String> = self
                .children
                .iter()
                .map(|c| match c {
                    Value::Conn(inner) => inner.expression(),
                    other => other.lexical(),
                })
                .collect();
            s.push('(');
            s.push_str(&args.join(", "));
            s.push(')');
        }
        s
    }

    /// Rendering: `name(leafInputs...)` once a name has been attached via
    /// `set_name`, otherwise `expression()`.
    pub fn string(&self) -> String {
        match &self.name {
            None => self.expression(),
            Some(name) => {
                let args: Vec<String> = self.leaf_inputs().iter().map(Value::lexical).collect();
                if args.is_empty() {
                    name.clone()
                } else {
                    format!("{name}({})", args.join(", "))
                }
            }
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_source(&mut self, source: Connection) {
        self.source = Some(Box::new(source));
    }

    /// The pre-substitution Connection this was derived from, or `self` if
    /// none was recorded (§4.3).
    pub fn source(&self) -> &Connection {
        self.source.as_deref().unwrap_or(self)
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    fn compute_hash(&self) -> u64 {
        let mut h = self.neuron.structural_hash();
        for child in &self.children {
            h = h.wrapping_add(value_hash(child));
        }
        h
    }

    /// Graph-description fragment: one node per neuron, one node per
    /// leaf/placeholder child, a trailing node for the (attempted) output.
    /// Concatenable with a caller-supplied header/footer (§4.3, §6).
    pub fn dot(&self, mut index: usize) -> (String, usize) {
        let mut s = String::new();
        let node_index = index;
        s.push_str(&format!(
            "n{index} [label=\"{}\", shape=circle, style=filled];\n",
            self.neuron.name()
        ));
        index += 1;

        for child in &self.children {
            match child {
                Value::Conn(inner) => {
                    let (frag, next) = inner.dot(index);
                    s.push_str(&format!("n{} -> n{node_index};\n", next - 1));
                    s.push_str(&frag);
                    index = next;
                }
                other => {
                    s.push_str(&format!(
                        "n{index} [label=\"{}\", shape=circle, style=filled];\n",
                        other.lexical()
                    ));
                    s.push_str(&format!("n{index} -> n{node_index};\n"));
                    index += 1;
                }
            }
        }

        let out_label = self
            .output()
            .map(|v| v.lexical())
            .unwrap_or_else(|_| self.neuron.output().name().to_string());
        s.push_str(&format!(
            "n{index} [label=\"{out_label}\", shape=circle, style=filled];\n"
        ));
        s.push_str(&format!("n{node_index} -> n{index};\n"));
        index += 1;

        (s, index)
    }

    /// Serialise per spec.md §6: `{ name, neuron, types, inputs }`. Each
    /// `inputs[i]` is a nested Connection object when `types[i]` is the
    /// reserved `"connection"` marker, otherwise the lexical form of a leaf
    /// value (or the placeholder's tag name).
    pub fn to_json(&self) -> serde_json::Value {
        let mut types = Vec::with_capacity(self.children.len());
        let mut inputs = Vec::with_capacity(self.children.len());
        for child in &self.children {
            match child {
                Value::Conn(inner) => {
                    types.push(json!("connection"));
                    inputs.push(inner.to_json());
                }
                other => {
                    types.push(json!(other.tag().name()));
                    inputs.push(json!(other.lexical()));
                }
            }
        }
        json!({
            "name": self.name.clone().unwrap_or_default(),
            "neuron": self.neuron.to_json(),
            "types": types,
            "inputs": inputs,
        })
    }

    /// Inverse of `to_json`. `neurons` is the Brain's current neuron
    /// library — the neuron's function is never serialised, so the
    /// referenced neuron must already exist by name + signature (§6, §7).
    pub fn from_json(json: &serde_json::Value, neurons: &[Arc<Neuron>]) -> EngineResult<Connection> {
        let obj = json
            .as_object()
            .ok_or_else(|| EngineError::MalformedConnection("expected object".to_string()))?;
        let neuron_json = obj
            .get("neuron")
            .ok_or_else(|| EngineError::MalformedConnection("missing 'neuron'".to_string()))?;
        let neuron = find_neuron(neuron_json, neurons)?;

        let types = obj
            .get("types")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EngineError::MalformedConnection("missing 'types'".to_string()))?;
        let inputs = obj
            .get("inputs")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EngineError::MalformedConnection("missing 'inputs'".to_string()))?;
        if types.len() != inputs.len() {
            return Err(EngineError::MalformedConnection(
                "types/inputs length mismatch".to_string(),
            ));
        }

        let mut children = Vec::with_capacity(types.len());
        for (t, v) in types.iter().zip(inputs.iter()) {
            let tag_name = t
                .as_str()
                .ok_or_else(|| EngineError::MalformedConnection("non-string type tag".to_string()))?;
            if tag_name == "connection" {
                children.push(Value::Conn(Box::new(Connection::from_json(v, neurons)?)));
            } else {
                let tag = TypeTag::from_name(tag_name)?;
                let literal = v
                    .as_str()
                    .ok_or_else(|| EngineError::MalformedConnection("non-string leaf".to_string()))?;
                children.push(Value::parse_leaf(tag, literal)?);
            }
        }

        let mut conn = Connection::make(neuron, children)?;
        if let Some(name) = obj.get("name").and_then(|v| v.as_str()) {
            if !name.is_empty() {
                conn.set_name(name);
            }
        }
        Ok(conn)
    }
}

fn find_neuron(neuron_json: &serde_json::Value, neurons: &[Arc<Neuron>]) -> EngineResult<Arc<Neuron>> {
    let obj = neuron_json
        .as_object()
        .ok_or_else(|| EngineError::MalformedConnection("expected neuron object".to_string()))?;
    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| EngineError::MalformedConnection("missing neuron name".to_string()))?;
    let input_types = obj
        .get("inputTypes")
        .and_then(|v| v.as_array())
        .ok_or_else(|| EngineError::MalformedConnection("missing inputTypes".to_string()))?
        .iter()
        .map(|v| {
            v.as_str()
                .ok_or_else(|| EngineError::MalformedConnection("non-string inputType".to_string()))
                .and_then(TypeTag::from_name)
        })
        .collect::<EngineResult<Vec<_>>>()?;
    let output_type = obj
        .get("outputType")
        .and_then(|v| v.as_str())
        .ok_or_else(|| EngineError::MalformedConnection("missing outputType".to_string()))
        .and_then(TypeTag::from_name)?;

    neurons
        .iter()
        .find(|n| n.name() == name && n.inputs() == input_types.as_slice() && n.output() == output_type)
        .cloned()
        .ok_or_else(|| EngineError::UnknownNeuron(name.to_string()))
}

impl PartialEq for Connection {
    /// Equal iff the neurons are the same object and the children are
    /// pairwise equal (§3).
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.neuron, &other.neuron) && self.children == other.children
    }
}

impl Eq for Connection {}

impl std::hash::Hash for Connection {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}
