//! Unsupervised estimation with Baum-Welch expectation-maximisation.
//!
//! Each iteration runs the scaled forward-backward pass on every non-empty
//! sequence (E-step), folds the posteriors into expected counts, then
//! smooths and renormalises those counts into new parameters (M-step).
//! Per-sequence E-steps are independent and run through
//! [`map_sequences`](crate::engine::map_sequences); the reduction walks the
//! results in input order.

use rand::{rngs::StdRng, SeedableRng};

use crate::builder::BaumWelchBuilder;
use crate::engine::map_sequences;
use crate::error::{HmmError, Result};
use crate::forward_backward::forward_backward;
use crate::matrix::DenseMatrix;
use crate::params::HmmParams;
use crate::sequences::SequenceSet;
use crate::utils::normalize_in_place;

/// Configured Baum-Welch trainer. Build one with [`BaumWelchBuilder`].
#[derive(Clone, Debug, PartialEq)]
pub struct BaumWelch {
    pub(crate) n_states: usize,
    pub(crate) n_symbols: Option<usize>,
    pub(crate) smoothing: f64,
    pub(crate) max_iters: usize,
    pub(crate) tolerance: f64,
    pub(crate) seed: u64,
}

/// Result of a Baum-Welch run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaumWelchFit {
    /// Parameters after the final M-step.
    pub params: HmmParams,
    /// Total log-likelihood of the data under the parameters entering each
    /// iteration's E-step.
    pub log_likelihoods: Vec<f64>,
    /// Number of iterations run.
    pub iterations: usize,
    /// Whether the tolerance was met before the budget ran out.
    pub converged: bool,
}

/// Expected counts collected by the E-step.
///
/// Sums of statistics are statistics, so per-sequence values merge by plain
/// addition in any grouping.
#[derive(Clone, Debug, PartialEq)]
pub struct SufficientStats {
    pub initial: Vec<f64>,
    pub transition: DenseMatrix,
    pub emission: DenseMatrix,
    pub log_likelihood: f64,
}

impl SufficientStats {
    pub fn zeros(n_states: usize, n_symbols: usize) -> Self {
        Self {
            initial: vec![0.0; n_states],
            transition: DenseMatrix::zeros(n_states, n_states),
            emission: DenseMatrix::zeros(n_states, n_symbols),
            log_likelihood: 0.0,
        }
    }

    /// E-step for one non-empty sequence.
    pub fn from_sequence(params: &HmmParams, obs: &[usize]) -> Result<Self> {
        let post = forward_backward(params, obs)?;
        let mut emission = DenseMatrix::zeros(params.n_states(), params.n_symbols());
        for (t, &sym) in obs.iter().enumerate() {
            for s in 0..params.n_states() {
                emission.add_at(s, sym, post.gamma.get(s, t));
            }
        }
        Ok(Self {
            initial: post.gamma.column(0),
            transition: post.xi,
            emission,
            log_likelihood: post.log_likelihood,
        })
    }

    pub fn merge(&mut self, other: &SufficientStats) {
        for (a, b) in self.initial.iter_mut().zip(&other.initial) {
            *a += b;
        }
        self.transition.add_assign(&other.transition);
        self.emission.add_assign(&other.emission);
        self.log_likelihood += other.log_likelihood;
    }

    /// M-step: add `smoothing` to every cell and renormalise.
    pub fn into_params(self, smoothing: f64) -> HmmParams {
        let SufficientStats {
            mut initial,
            mut transition,
            mut emission,
            ..
        } = self;
        initial.iter_mut().for_each(|c| *c += smoothing);
        normalize_in_place(&mut initial);
        transition.add_scalar(smoothing);
        transition.normalize_rows();
        emission.add_scalar(smoothing);
        emission.normalize_rows();
        HmmParams::from_normalized(initial, transition, emission)
    }
}

impl BaumWelch {
    pub fn builder(n_states: usize) -> BaumWelchBuilder {
        BaumWelchBuilder::new(n_states)
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fit from a seeded random starting point.
    ///
    /// # Errors
    /// `Estimation` if every sequence is empty (or the symbol count cannot be
    /// inferred); `DimensionMismatch` if a symbol exceeds a supplied count.
    pub fn fit(&self, observations: &SequenceSet) -> Result<BaumWelchFit> {
        let n_symbols = observations.resolve_n_symbols(self.n_symbols)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let init = HmmParams::random(self.n_states, n_symbols, &mut rng)?;
        self.fit_from(init, observations)
    }

    /// Fit starting from caller-supplied parameters, e.g. a supervised
    /// estimate. The state and symbol counts come from `init`.
    pub fn fit_from(&self, init: HmmParams, observations: &SequenceSet) -> Result<BaumWelchFit> {
        observations.check_bound("symbol", init.n_symbols())?;
        let usable: Vec<&[usize]> = observations.non_empty().collect();
        if usable.is_empty() {
            return Err(HmmError::Estimation(
                "all observation sequences are empty".into(),
            ));
        }

        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "baum_welch_fit",
            n_states = init.n_states(),
            n_symbols = init.n_symbols(),
            sequences = usable.len()
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let (n_states, n_symbols) = (init.n_states(), init.n_symbols());
        let mut params = init;
        let mut log_likelihoods = Vec::with_capacity(self.max_iters);
        let mut prev_ll = f64::NEG_INFINITY;
        let mut converged = false;

        for _iteration in 0..self.max_iters {
            let per_sequence = map_sequences(&usable, |obs| SufficientStats::from_sequence(&params, obs));
            let mut totals = SufficientStats::zeros(n_states, n_symbols);
            for stats in per_sequence {
                totals.merge(&stats?);
            }
            let total_ll = totals.log_likelihood;
            params = totals.into_params(self.smoothing);
            log_likelihoods.push(total_ll);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                iteration = _iteration,
                total_ll,
                delta = total_ll - prev_ll,
                "baum-welch iteration"
            );

            if (total_ll - prev_ll).abs() < self.tolerance {
                converged = true;
                break;
            }
            prev_ll = total_ll;
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            iterations = log_likelihoods.len(),
            converged,
            final_ll = log_likelihoods.last().copied().unwrap_or(f64::NAN),
            "baum-welch finished"
        );

        Ok(BaumWelchFit {
            params,
            iterations: log_likelihoods.len(),
            log_likelihoods,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(v: Vec<Vec<usize>>) -> SequenceSet {
        SequenceSet::new(v)
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let data = seqs(vec![vec![0, 1, 1, 0, 2], vec![2, 2, 1], vec![]]);
        let bw = BaumWelch::builder(2).with_seed(42).build().unwrap();
        let a = bw.fit(&data).unwrap();
        let b = bw.fit(&data).unwrap();
        assert_eq!(a.params, b.params);
        assert_eq!(a.log_likelihoods, b.log_likelihoods);
        assert_eq!(a.params.n_symbols(), 3);
    }

    #[test]
    fn iteration_budget_bounds_the_trace() {
        let data = seqs(vec![vec![0, 1, 0, 1, 1, 0, 0, 1]]);
        let fit = BaumWelch::builder(3)
            .with_max_iters(4)
            .with_tolerance(0.0)
            .build()
            .unwrap()
            .fit(&data)
            .unwrap();
        assert_eq!(fit.iterations, 4);
        assert_eq!(fit.log_likelihoods.len(), 4);
        assert!(!fit.converged);
    }

    #[test]
    fn all_empty_is_an_estimation_error() {
        let bw = BaumWelch::builder(2).build().unwrap();
        assert!(matches!(bw.fit(&seqs(vec![vec![], vec![]])), Err(HmmError::Estimation(_))));
        let bw = BaumWelch::builder(2).with_n_symbols(2).build().unwrap();
        assert!(matches!(bw.fit(&seqs(vec![vec![]])), Err(HmmError::Estimation(_))));
    }

    #[test]
    fn symbol_beyond_declared_alphabet_is_rejected() {
        let bw = BaumWelch::builder(2).with_n_symbols(2).build().unwrap();
        assert!(matches!(
            bw.fit(&seqs(vec![vec![0, 1, 2]])),
            Err(HmmError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn merge_is_addition() {
        let model = HmmParams::from_rows(
            vec![0.6, 0.4],
            &[vec![0.7, 0.3], vec![0.4, 0.6]],
            &[vec![0.6, 0.4], vec![0.3, 0.7]],
        )
        .unwrap();
        let a = SufficientStats::from_sequence(&model, &[0, 1, 1]).unwrap();
        let b = SufficientStats::from_sequence(&model, &[1, 0]).unwrap();
        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);
        assert!((ab.log_likelihood - ba.log_likelihood).abs() < 1e-12);
        assert!((ab.transition.sum() - 3.0).abs() < 1e-9);
        assert!((ab.emission.sum() - 5.0).abs() < 1e-9);
        assert!((ab.initial.iter().sum::<f64>() - 2.0).abs() < 1e-9);
    }
}
