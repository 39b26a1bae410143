//! Circuit model: gate kinds, the validated graph and a builder.

pub mod builder;
pub mod gate;
pub mod graph;

pub use builder::CircuitBuilder;
pub use gate::{Arity, GateKind};
pub use graph::{demo_circuit, Circuit, Node, NodeId};
