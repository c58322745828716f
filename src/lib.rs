//! A typed program-synthesis engine: given a library of named typed
//! operators ("neurons") and a set of target values, search the space of
//! well-typed expression trees ("connections") built from those operators
//! and return, per target, a minimum-cost expression whose evaluated output
//! minimises a domain-sensitive distance to that target.
//!
//! Dependency order mirrors the module layout: [`value`] → [`neuron`] →
//! [`connection`] → [`enumerator`] → [`refinement`], composed by [`brain`].

pub mod brain;
pub mod connection;
pub mod enumerator;
pub mod error;
pub mod heuristic;
pub mod neuron;
mod odometer;
pub mod refinement;
pub mod value;

pub use brain::{Brain, DEFAULT_EPS, DEFAULT_LEVEL};
pub use connection::Connection;
pub use error::{EngineError, EngineResult};
pub use neuron::{Neuron, NeuronOp};
pub use value::{Grid, TypeTag, Value};

/// Install a `tracing` subscriber reading `RUST_LOG` (or `info` by default),
/// matching the teacher's own instrumentation setup. Intended for binaries
/// and examples embedding the engine; library code only emits spans/events.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}
