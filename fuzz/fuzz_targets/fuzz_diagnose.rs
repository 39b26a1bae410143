//! Structured fuzzing of the incremental posterior update.
//!
//! Whatever the observations, the posterior stays a distribution, and a
//! rejected observation leaves it unchanged.

#![no_main]

use arbitrary::Arbitrary;
use fd_core::inference::{Diagnoser, HypothesisSet, LikelihoodModel, Observation};
use fd_core::Circuit;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    include_no_fault: bool,
    /// Noise probability in thousandths; 0 gives the exact model.
    noise_milli: u8,
    observations: Vec<(bool, bool, bool)>,
}

fuzz_target!(|input: Input| {
    let circuit = Circuit::demo().unwrap();
    let set = HypothesisSet::uniform(&circuit, input.include_no_fault).unwrap();
    let model = LikelihoodModel::new(1.0, f64::from(input.noise_milli) / 1000.0).unwrap();
    let mut d = Diagnoser::new(&circuit, set, model).unwrap();

    for (a, b, out) in input.observations {
        let before = d.posterior();
        if d.observe(&Observation::new(vec![a, b], vec![out])).is_err() {
            assert_eq!(before, d.posterior());
            continue;
        }
        let sum: f64 = d.posterior().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "posterior sums to {sum}");
    }
});
