//! Fuzz target for observation file parsing against the demo circuit.

#![no_main]

use fd_config::ObservationSet;
use fd_core::inference::Observation;
use fd_core::Circuit;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Should never panic, only return an error
    if let Ok(set) = serde_json::from_slice::<ObservationSet>(data) {
        let _ = Observation::from_set(&Circuit::demo().unwrap(), &set);
    }
});
