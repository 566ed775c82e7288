//! Assorted numeric helpers shared by the estimators and decoders.

use rand::Rng;

/// Substitute for an exactly-zero normaliser.
///
/// Keeps every division defined; a sequence whose probability underflows to
/// zero yields a degenerate but finite result instead of NaN.
pub const PROB_FLOOR: f64 = 1e-12;

/// Replace an exactly-zero denominator with [`PROB_FLOOR`].
#[inline]
pub fn floored(denominator: f64) -> f64 {
    if denominator == 0.0 {
        PROB_FLOOR
    } else {
        denominator
    }
}

/// Normalise `values` to sum to one and return the (floored) normaliser.
#[inline]
pub fn normalize_in_place(values: &mut [f64]) -> f64 {
    let total = floored(values.iter().sum());
    values.iter_mut().for_each(|v| *v /= total);
    total
}

/// Index of the first maximal element.
///
/// Ties resolve to the lowest index; NaN never wins. Returns 0 for an empty
/// slice.
#[inline]
pub fn argmax_first(values: &[f64]) -> usize {
    let mut best_idx = 0;
    let mut best = f64::NEG_INFINITY;
    for (idx, &v) in values.iter().enumerate() {
        if v > best {
            best = v;
            best_idx = idx;
        }
    }
    best_idx
}

/// Draw an index from the (not necessarily normalised) weights.
pub fn sample_categorical<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    let mut target = rng.gen::<f64>() * total;
    for (idx, &w) in weights.iter().enumerate() {
        if target < w {
            return idx;
        }
        target -= w;
    }
    weights.len().saturating_sub(1)
}
