//! Numerically stable primitives for log-domain Bayesian math.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let sum: f64 = values.iter().map(|v| (*v - max).exp()).sum();
    max + sum.ln()
}

/// Natural log of a probability, mapping 0 to -inf.
///
/// Negative or NaN inputs yield NaN so callers can reject them.
pub fn ln_prob(p: f64) -> f64 {
    if p.is_nan() || p < 0.0 {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    p.ln()
}

/// Normalize unnormalized log weights into log probabilities.
///
/// Entries that are -inf stay -inf. If every entry is -inf (or the input is
/// empty) the result is all NaN, since no distribution exists.
pub fn normalize_log_probs(log_weights: &[f64]) -> Vec<f64> {
    let total = log_sum_exp(log_weights);
    if !total.is_finite() {
        return vec![f64::NAN; log_weights.len()];
    }
    log_weights.iter().map(|w| w - total).collect()
}

/// Exponentiate log probabilities and renormalize so the output sums to 1.
///
/// The extra division absorbs rounding drift from `exp`.
pub fn probs_from_log(log_probs: &[f64]) -> Vec<f64> {
    let raw: Vec<f64> = log_probs.iter().map(|lp| lp.exp()).collect();
    let sum: f64 = raw.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        raw.iter().map(|p| p / sum).collect()
    } else {
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn log_sum_exp_basic() {
        let out = log_sum_exp(&[0.0, 0.0]);
        assert!(approx_eq(out, 2.0f64.ln(), 1e-12));
    }

    #[test]
    fn log_sum_exp_dominance() {
        let out = log_sum_exp(&[-1000.0, 0.0]);
        assert!(approx_eq(out, 0.0, 1e-12));
    }

    #[test]
    fn log_sum_exp_all_neg_inf() {
        let out = log_sum_exp(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        assert!(out.is_infinite() && out.is_sign_negative());
    }

    #[test]
    fn log_sum_exp_nan_propagates() {
        assert!(log_sum_exp(&[0.0, f64::NAN]).is_nan());
    }

    #[test]
    fn ln_prob_edges() {
        assert_eq!(ln_prob(0.0), f64::NEG_INFINITY);
        assert!(ln_prob(-0.1).is_nan());
        assert!(ln_prob(f64::NAN).is_nan());
        assert!(approx_eq(ln_prob(1.0), 0.0, 1e-15));
    }

    #[test]
    fn normalize_keeps_zero_mass_entries() {
        let out = normalize_log_probs(&[0.0, f64::NEG_INFINITY, 0.0]);
        assert!(approx_eq(out[0], 0.5f64.ln(), 1e-12));
        assert_eq!(out[1], f64::NEG_INFINITY);
        assert!(approx_eq(out[2], 0.5f64.ln(), 1e-12));
    }

    #[test]
    fn normalize_degenerate_is_nan() {
        let out = normalize_log_probs(&[f64::NEG_INFINITY, f64::NEG_INFINITY]);
        assert!(out.iter().all(|v| v.is_nan()));
        assert!(normalize_log_probs(&[]).is_empty());
    }

    #[test]
    fn probs_from_log_sums_to_one() {
        let logs = normalize_log_probs(&[-1.0, -2.0, -3.0]);
        let probs = probs_from_log(&logs);
        let sum: f64 = probs.iter().sum();
        assert!(approx_eq(sum, 1.0, 1e-12));
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }
}
