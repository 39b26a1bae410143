//! Summary statistics over discrete probability vectors.
//!
//! All functions treat their input as a categorical distribution. They do not
//! renormalize; callers pass probabilities that already sum to 1.

use std::f64::consts::LN_2;

/// Shannon entropy in bits. Zero-probability entries contribute nothing.
pub fn entropy_bits(probs: &[f64]) -> f64 {
    let nats: f64 = probs
        .iter()
        .filter(|p| **p > 0.0)
        .map(|p| -p * p.ln())
        .sum();
    nats / LN_2
}

/// Maximum entropy for a distribution over `n` outcomes, in bits.
pub fn max_entropy_bits(n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    (n as f64).log2()
}

/// Total variation distance: half the L1 distance between two distributions.
///
/// Returns NaN when the lengths differ.
pub fn total_variation(p: &[f64], q: &[f64]) -> f64 {
    if p.len() != q.len() {
        return f64::NAN;
    }
    0.5 * p.iter().zip(q).map(|(a, b)| (a - b).abs()).sum::<f64>()
}

/// Index of the largest entry. Ties resolve to the lowest index.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if *v <= b => {}
            _ => best = Some((i, *v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_uniform_is_log2_n() {
        let p = [0.25; 4];
        assert!((entropy_bits(&p) - 2.0).abs() < 1e-12);
        assert!((max_entropy_bits(4) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn entropy_of_point_mass_is_zero() {
        assert_eq!(entropy_bits(&[0.0, 1.0, 0.0]), 0.0);
        assert_eq!(max_entropy_bits(1), 0.0);
    }

    #[test]
    fn total_variation_bounds() {
        assert_eq!(total_variation(&[1.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((total_variation(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-12);
        assert!(total_variation(&[1.0], &[0.5, 0.5]).is_nan());
    }

    #[test]
    fn argmax_prefers_first_on_tie() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[f64::NAN, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
    }
}
