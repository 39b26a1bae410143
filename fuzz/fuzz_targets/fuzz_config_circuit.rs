//! Fuzz target for circuit description loading.
//!
//! Arbitrary JSON must either fail to parse, fail validation, or yield a
//! circuit that simulates every input vector without panicking.

#![no_main]

use fd_config::CircuitDescription;
use fd_core::simulate::{exhaustive_inputs, simulate_outputs};
use fd_core::Circuit;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(desc) = serde_json::from_slice::<CircuitDescription>(data) else {
        return;
    };
    let Ok(circuit) = Circuit::from_description(&desc) else {
        return;
    };
    if circuit.inputs().len() > 8 {
        return;
    }
    for v in exhaustive_inputs(circuit.inputs().len()).unwrap() {
        let out = simulate_outputs(&circuit, &v, None).unwrap();
        assert_eq!(out.len(), circuit.outputs().len());
    }
});
