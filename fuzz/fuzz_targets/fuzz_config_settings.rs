//! Fuzz target for settings.json parsing.
//!
//! Settings that pass validation must build a normalized prior over the
//! demo circuit.

#![no_main]

use fd_config::validate::validate_settings;
use fd_config::DiagnosisSettings;
use fd_core::inference::{HypothesisSet, LikelihoodModel};
use fd_core::Circuit;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(settings) = serde_json::from_slice::<DiagnosisSettings>(data) else {
        return;
    };
    if validate_settings(&settings).is_err() {
        return;
    }
    let _ = LikelihoodModel::from_params(&settings.likelihood);
    if let Ok(set) = HypothesisSet::from_settings(&Circuit::demo().unwrap(), &settings) {
        let sum: f64 = set.prior().iter().sum();
        assert!((sum - 1.0).abs() < 1e-6, "prior sums to {sum}");
    }
});
