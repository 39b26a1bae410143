//! Stuck-at fault injection and circuit simulation.

pub mod compare;
pub mod fault;
pub mod report;
pub mod trace;

pub use compare::{compare_traces, detects, first_detecting_input, Detection, NodeDiff};
pub use fault::{Fault, FaultDescription};
pub use report::{RunRecord, SimulationReport};
pub use trace::{
    exhaustive_inputs, format_bits, parse_input_vector, simulate, simulate_batch,
    simulate_outputs, SimulationRun, Trace, MAX_EXHAUSTIVE_INPUTS,
};
