//! Supervised maximum-likelihood estimation from labeled sequences.
//!
//! Counts initial states, consecutive state pairs and `(state, symbol)`
//! co-occurrences into dense tables, adds a smoothing pseudocount to every
//! cell and row-normalises.

use crate::error::{HmmError, Result};
use crate::matrix::DenseMatrix;
use crate::params::HmmParams;
use crate::sequences::{LabeledSequences, SequenceSet};
use crate::utils::normalize_in_place;

/// Default additive pseudocount for supervised counting.
pub const DEFAULT_SUPERVISED_SMOOTHING: f64 = 1.0;

/// Smoothed frequency-count estimator.
#[derive(Clone, Debug, PartialEq)]
pub struct SupervisedEstimator {
    n_states: usize,
    n_symbols: Option<usize>,
    smoothing: f64,
}

impl SupervisedEstimator {
    pub fn new(n_states: usize) -> Self {
        Self {
            n_states,
            n_symbols: None,
            smoothing: DEFAULT_SUPERVISED_SMOOTHING,
        }
    }

    /// Fix the alphabet size instead of inferring `1 + max symbol`.
    pub fn with_n_symbols(mut self, n_symbols: usize) -> Self {
        self.n_symbols = Some(n_symbols);
        self
    }

    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Estimate `(initial, transition, emission)` from aligned pairs.
    ///
    /// # Errors
    /// - `Estimation` if `n_states` is zero, or the symbol count is not
    ///   supplied and every observation sequence is empty.
    /// - `InvalidConfig` for a negative or non-finite smoothing constant.
    /// - `DimensionMismatch` if a state or symbol falls outside its range.
    pub fn fit(&self, data: &LabeledSequences) -> Result<HmmParams> {
        self.fit_sequences(&data.states, &data.observations)
    }

    /// Same as [`fit`](Self::fit) with the two collections passed separately.
    pub fn fit_sequences(&self, states: &SequenceSet, observations: &SequenceSet) -> Result<HmmParams> {
        if self.n_states == 0 {
            return Err(HmmError::Estimation("state count must be positive".into()));
        }
        if !self.smoothing.is_finite() || self.smoothing < 0.0 {
            return Err(HmmError::InvalidConfig(format!(
                "smoothing must be a non-negative finite number, got {}",
                self.smoothing
            )));
        }
        let n_symbols = observations.resolve_n_symbols(self.n_symbols)?;
        states.check_bound("state", self.n_states)?;

        let (initial, transition) = self.estimate_initial_and_transition(states);
        let emission = self.estimate_emission(states, observations, n_symbols)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            n_states = self.n_states,
            n_symbols,
            sequences = states.len(),
            smoothing = self.smoothing,
            "supervised estimate complete"
        );

        Ok(HmmParams::from_normalized(initial, transition, emission))
    }

    fn estimate_initial_and_transition(&self, states: &SequenceSet) -> (Vec<f64>, DenseMatrix) {
        let n = self.n_states;
        let mut initial = vec![0.0; n];
        let mut transition = DenseMatrix::zeros(n, n);

        for seq in states.non_empty() {
            initial[seq[0]] += 1.0;
            for pair in seq.windows(2) {
                transition.add_at(pair[0], pair[1], 1.0);
            }
        }

        initial.iter_mut().for_each(|c| *c += self.smoothing);
        normalize_in_place(&mut initial);
        transition.add_scalar(self.smoothing);
        transition.normalize_rows();
        (initial, transition)
    }

    fn estimate_emission(
        &self,
        states: &SequenceSet,
        observations: &SequenceSet,
        n_symbols: usize,
    ) -> Result<DenseMatrix> {
        let mut emission = DenseMatrix::zeros(self.n_states, n_symbols);
        for (s_seq, o_seq) in states.iter().zip(observations.iter()) {
            let t_len = s_seq.len().min(o_seq.len());
            for t in 0..t_len {
                let sym = o_seq[t];
                if sym >= n_symbols {
                    return Err(HmmError::out_of_range("symbol", t, sym, n_symbols));
                }
                emission.add_at(s_seq[t], sym, 1.0);
            }
        }
        emission.add_scalar(self.smoothing);
        emission.normalize_rows();
        Ok(emission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(states: Vec<Vec<usize>>, obs: Vec<Vec<usize>>) -> LabeledSequences {
        LabeledSequences::new(states.into(), obs.into())
    }

    #[test]
    fn counts_with_laplace_smoothing() {
        let data = pairs(vec![vec![0, 0, 1]], vec![vec![0, 1, 1]]);
        let hmm = SupervisedEstimator::new(2).fit(&data).unwrap();
        // initial: counts [1,0] + 1 -> [2/3, 1/3]
        assert!((hmm.initial()[0] - 2.0 / 3.0).abs() < 1e-12);
        // transition row 0: counts [1,1] + 1 -> [0.5, 0.5]; row 1: [0,0] + 1
        assert!((hmm.transition().get(0, 1) - 0.5).abs() < 1e-12);
        assert!((hmm.transition().get(1, 0) - 0.5).abs() < 1e-12);
        // emission row 0: symbols {0,1} once each; row 1: symbol 1 once
        assert!((hmm.emission().get(1, 1) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn explicit_symbol_count_widens_alphabet() {
        let data = pairs(vec![vec![0, 1]], vec![vec![0, 0]]);
        let hmm = SupervisedEstimator::new(2).with_n_symbols(4).fit(&data).unwrap();
        assert_eq!(hmm.n_symbols(), 4);
        assert!((hmm.emission().get(1, 3) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_truncate() {
        let data = pairs(vec![vec![1, 1, 1, 1]], vec![vec![0]]);
        let hmm = SupervisedEstimator::new(2)
            .with_n_symbols(2)
            .with_smoothing(0.0)
            .fit(&data)
            .unwrap();
        assert_eq!(hmm.emission().row(1), &[1.0, 0.0]);
    }

    #[test]
    fn all_empty_observations_fail_inference() {
        let data = pairs(vec![vec![], vec![]], vec![vec![], vec![]]);
        assert!(matches!(
            SupervisedEstimator::new(2).fit(&data),
            Err(HmmError::Estimation(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_and_bad_config() {
        let data = pairs(vec![vec![0, 2]], vec![vec![0, 1]]);
        assert!(matches!(
            SupervisedEstimator::new(2).fit(&data),
            Err(HmmError::DimensionMismatch { what: "state", .. })
        ));
        let data = pairs(vec![vec![0, 1]], vec![vec![0, 3]]);
        assert!(matches!(
            SupervisedEstimator::new(2).with_n_symbols(2).fit(&data),
            Err(HmmError::DimensionMismatch { what: "symbol", .. })
        ));
        assert!(matches!(
            SupervisedEstimator::new(2).with_smoothing(-1.0).fit(&data),
            Err(HmmError::InvalidConfig(_))
        ));
    }
}
