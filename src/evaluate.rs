//! Accuracy and hidden-state relabelling for decoded paths.

use crate::error::{HmmError, Result};

/// Number of observed outcome labels (loss = 0, win = 1).
pub const N_LABELS: usize = 2;

/// Pooled index-wise accuracy over paired sequences.
///
/// Each pair is truncated to its shorter length; the result is
/// `matches / compared` over all pairs together, or `0.0` when nothing was
/// compared.
pub fn sequence_accuracy<T, P>(truth: &[T], predicted: &[P]) -> f64
where
    T: AsRef<[usize]>,
    P: AsRef<[usize]>,
{
    let mut matches = 0usize;
    let mut compared = 0usize;
    for (y_true, y_pred) in truth.iter().zip(predicted) {
        let (y_true, y_pred) = (y_true.as_ref(), y_pred.as_ref());
        let t = y_true.len().min(y_pred.len());
        matches += y_true[..t]
            .iter()
            .zip(&y_pred[..t])
            .filter(|(a, b)| a == b)
            .count();
        compared += t;
    }
    if compared == 0 {
        0.0
    } else {
        matches as f64 / compared as f64
    }
}

/// Mapping from unlabeled hidden states to observed binary labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateLabelMap {
    labels: Vec<usize>,
}

impl StateLabelMap {
    /// Build the mapping from co-occurrence counts.
    ///
    /// Each hidden state takes the label it co-occurs with most (ties go to
    /// label 0). States never observed take `fallback`, or the global
    /// majority label when `fallback` is `None` (ties go to label 0).
    ///
    /// # Errors
    /// `DimensionMismatch` for a hidden state `>= n_hidden` or a label
    /// `>= 2`; `InvalidConfig` for a fallback label `>= 2`.
    pub fn fit<H, L>(
        hidden: &[H],
        labels: &[L],
        n_hidden: usize,
        fallback: Option<usize>,
    ) -> Result<Self>
    where
        H: AsRef<[usize]>,
        L: AsRef<[usize]>,
    {
        if let Some(f) = fallback.filter(|&f| f >= N_LABELS) {
            return Err(HmmError::InvalidConfig(format!(
                "fallback label {f} is not binary"
            )));
        }
        let mut counts = vec![[0usize; N_LABELS]; n_hidden];
        let mut global = [0usize; N_LABELS];

        for (h_seq, l_seq) in hidden.iter().zip(labels) {
            let (h_seq, l_seq) = (h_seq.as_ref(), l_seq.as_ref());
            let t_len = h_seq.len().min(l_seq.len());
            for t in 0..t_len {
                let (h, l) = (h_seq[t], l_seq[t]);
                if h >= n_hidden {
                    return Err(HmmError::out_of_range("hidden state", t, h, n_hidden));
                }
                if l >= N_LABELS {
                    return Err(HmmError::out_of_range("label", t, l, N_LABELS));
                }
                counts[h][l] += 1;
                global[l] += 1;
            }
        }

        let default_label = fallback.unwrap_or(if global[0] >= global[1] { 0 } else { 1 });
        let labels = counts
            .iter()
            .map(|c| match c {
                [0, 0] => default_label,
                [zero, one] if one > zero => 1,
                _ => 0,
            })
            .collect();
        Ok(Self { labels })
    }

    /// Label assigned to each hidden state, indexed by state.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn n_hidden(&self) -> usize {
        self.labels.len()
    }

    /// Element-wise lookup of a hidden path.
    pub fn apply(&self, hidden: &[usize]) -> Result<Vec<usize>> {
        hidden
            .iter()
            .enumerate()
            .map(|(t, &h)| {
                self.labels
                    .get(h)
                    .copied()
                    .ok_or_else(|| HmmError::out_of_range("hidden state", t, h, self.labels.len()))
            })
            .collect()
    }

    /// Map every path; empty paths stay empty.
    pub fn apply_all<H: AsRef<[usize]>>(&self, hidden: &[H]) -> Result<Vec<Vec<usize>>> {
        hidden.iter().map(|h| self.apply(h.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_accuracy() {
        let truth: Vec<Vec<usize>> = vec![vec![1, 0, 1, 1, 0]];
        let pred: Vec<Vec<usize>> = vec![vec![1, 1, 1, 0, 0]];
        assert!((sequence_accuracy(&truth, &pred) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn accuracy_pools_rather_than_averages() {
        // 1/1 and 0/3: pooled 1/4, not the 0.5 a per-sequence mean would give.
        let truth: Vec<Vec<usize>> = vec![vec![1], vec![0, 0, 0]];
        let pred: Vec<Vec<usize>> = vec![vec![1], vec![1, 1, 1]];
        assert!((sequence_accuracy(&truth, &pred) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn accuracy_with_nothing_compared_is_zero() {
        let empty: Vec<Vec<usize>> = vec![vec![]];
        assert_eq!(sequence_accuracy(&empty, &[vec![1usize, 0]]), 0.0);
        assert_eq!(sequence_accuracy::<Vec<usize>, Vec<usize>>(&[], &[]), 0.0);
    }

    #[test]
    fn maps_states_by_majority_label() {
        let map = StateLabelMap::fit(&[vec![0usize, 0, 1, 1]], &[vec![1usize, 1, 0, 0]], 2, None).unwrap();
        assert_eq!(map.labels(), &[1, 0]);
        assert_eq!(map.apply(&[0, 1, 0]).unwrap(), vec![1, 0, 1]);
    }

    #[test]
    fn unseen_states_take_fallback_or_majority() {
        let hidden = [vec![0usize, 0, 0]];
        let labels = [vec![1usize, 1, 0]];
        let by_majority = StateLabelMap::fit(&hidden, &labels, 3, None).unwrap();
        assert_eq!(by_majority.labels(), &[1, 1, 1]);
        let explicit = StateLabelMap::fit(&hidden, &labels, 3, Some(0)).unwrap();
        assert_eq!(explicit.labels(), &[1, 0, 0]);
    }

    #[test]
    fn count_ties_go_to_label_zero() {
        let map = StateLabelMap::fit(&[vec![0usize, 0]], &[vec![0usize, 1]], 1, None).unwrap();
        assert_eq!(map.labels(), &[0]);
        let empty = StateLabelMap::fit::<Vec<usize>, Vec<usize>>(&[], &[], 2, None).unwrap();
        assert_eq!(empty.labels(), &[0, 0]);
    }

    #[test]
    fn rejects_out_of_range_codes() {
        assert!(StateLabelMap::fit(&[vec![2usize]], &[vec![0usize]], 2, None).is_err());
        assert!(StateLabelMap::fit(&[vec![0usize]], &[vec![2usize]], 2, None).is_err());
        assert!(StateLabelMap::fit(&[vec![0usize]], &[vec![1usize]], 2, Some(3)).is_err());
        let map = StateLabelMap::fit(&[vec![0usize]], &[vec![1usize]], 1, None).unwrap();
        assert!(map.apply(&[1]).is_err());
        assert_eq!(map.apply_all(&[vec![], vec![0usize]]).unwrap(), vec![vec![], vec![1]]);
    }
}
