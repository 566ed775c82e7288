//! HMM parameter triple `(initial, transition, emission)`.
//!
//! [`HmmParams`] is immutable to callers once constructed. Estimators produce
//! it, decoders and the evaluator only borrow it.

use rand::distributions::Open01;
use rand::Rng;

use crate::error::{HmmError, Result};
use crate::matrix::DenseMatrix;
use crate::utils::{normalize_in_place, sample_categorical};

/// Tolerance used when validating that a vector or row is a distribution.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// Offset added to uniform draws when initialising random stochastic rows.
const RANDOM_ROW_OFFSET: f64 = 1e-6;

/// Discrete-emission hidden Markov model.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HmmParams {
    initial: Vec<f64>,
    /// `n_states x n_states`, row-stochastic: `[from][to]`.
    transition: DenseMatrix,
    /// `n_states x n_symbols`, row-stochastic: `[state][symbol]`.
    emission: DenseMatrix,
}

impl HmmParams {
    /// Validate shapes and probability constraints.
    ///
    /// # Errors
    /// `Estimation` for zero states or symbols, `InvalidParameters` for shape
    /// disagreements, negative or non-finite entries, and rows that do not
    /// sum to one within [`SUM_TOLERANCE`].
    pub fn new(initial: Vec<f64>, transition: DenseMatrix, emission: DenseMatrix) -> Result<Self> {
        let n = initial.len();
        if n == 0 {
            return Err(HmmError::Estimation("model needs at least one state".into()));
        }
        if emission.cols() == 0 {
            return Err(HmmError::Estimation("model needs at least one symbol".into()));
        }
        if transition.rows() != n || transition.cols() != n {
            return Err(HmmError::InvalidParameters(format!(
                "transition is {}x{}, expected {n}x{n}",
                transition.rows(),
                transition.cols()
            )));
        }
        if emission.rows() != n {
            return Err(HmmError::InvalidParameters(format!(
                "emission has {} rows, expected {n}",
                emission.rows()
            )));
        }

        check_distribution("initial", &initial)?;
        for s in 0..n {
            check_distribution("transition row", transition.row(s))?;
            check_distribution("emission row", emission.row(s))?;
        }

        Ok(Self {
            initial,
            transition,
            emission,
        })
    }

    /// Convenience constructor from nested rows.
    pub fn from_rows(
        initial: Vec<f64>,
        transition: &[Vec<f64>],
        emission: &[Vec<f64>],
    ) -> Result<Self> {
        let transition = DenseMatrix::from_rows(transition)
            .ok_or_else(|| HmmError::InvalidParameters("ragged transition rows".into()))?;
        let emission = DenseMatrix::from_rows(emission)
            .ok_or_else(|| HmmError::InvalidParameters("ragged emission rows".into()))?;
        Self::new(initial, transition, emission)
    }

    /// Assemble already-normalised tables without re-validating them.
    pub(crate) fn from_normalized(
        initial: Vec<f64>,
        transition: DenseMatrix,
        emission: DenseMatrix,
    ) -> Self {
        debug_assert_eq!(initial.len(), transition.rows());
        debug_assert_eq!(initial.len(), emission.rows());
        Self {
            initial,
            transition,
            emission,
        }
    }

    /// Random starting point for Baum-Welch.
    ///
    /// `initial` is a symmetric Dirichlet(1) draw (normalised unit
    /// exponentials); every transition and emission row is
    /// `uniform(0, 1) + 1e-6`, row-normalised.
    pub fn random<R: Rng + ?Sized>(n_states: usize, n_symbols: usize, rng: &mut R) -> Result<Self> {
        if n_states == 0 || n_symbols == 0 {
            return Err(HmmError::Estimation(format!(
                "cannot initialise a model with {n_states} states and {n_symbols} symbols"
            )));
        }
        let mut initial: Vec<f64> = (0..n_states)
            .map(|_| {
                let u: f64 = rng.sample(Open01);
                -u.ln()
            })
            .collect();
        normalize_in_place(&mut initial);

        let transition = random_stochastic(n_states, n_states, rng);
        let emission = random_stochastic(n_states, n_symbols, rng);
        Ok(Self::from_normalized(initial, transition, emission))
    }

    #[inline]
    pub fn n_states(&self) -> usize {
        self.initial.len()
    }

    #[inline]
    pub fn n_symbols(&self) -> usize {
        self.emission.cols()
    }

    pub fn initial(&self) -> &[f64] {
        &self.initial
    }

    pub fn transition(&self) -> &DenseMatrix {
        &self.transition
    }

    pub fn emission(&self) -> &DenseMatrix {
        &self.emission
    }

    /// Check every symbol of `observations` against the emission alphabet.
    pub fn check_observations(&self, observations: &[usize]) -> Result<()> {
        let bound = self.n_symbols();
        match observations.iter().position(|&o| o >= bound) {
            Some(t) => Err(HmmError::out_of_range("symbol", t, observations[t], bound)),
            None => Ok(()),
        }
    }

    /// Sequence log-likelihood `log P(observations | model)`.
    ///
    /// Empty sequences have likelihood one (log-likelihood zero).
    pub fn log_likelihood(&self, observations: &[usize]) -> Result<f64> {
        crate::forward_backward::log_likelihood(self, observations)
    }

    /// Draw a `(states, observations)` pair of length `len` from the model.
    pub fn sample<R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> (Vec<usize>, Vec<usize>) {
        let mut states = Vec::with_capacity(len);
        let mut observations = Vec::with_capacity(len);
        if len == 0 {
            return (states, observations);
        }
        let mut s = sample_categorical(&self.initial, rng);
        for t in 0..len {
            if t > 0 {
                s = sample_categorical(self.transition.row(s), rng);
            }
            states.push(s);
            observations.push(sample_categorical(self.emission.row(s), rng));
        }
        (states, observations)
    }
}

fn random_stochastic<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> DenseMatrix {
    let mut m = DenseMatrix::zeros(rows, cols);
    for r in 0..rows {
        for c in 0..cols {
            m.set(r, c, rng.gen::<f64>() + RANDOM_ROW_OFFSET);
        }
    }
    m.normalize_rows();
    m
}

fn check_distribution(what: &str, values: &[f64]) -> Result<()> {
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(HmmError::InvalidParameters(format!(
            "{what} contains invalid probability {bad}"
        )));
    }
    let total: f64 = values.iter().sum();
    if (total - 1.0).abs() > SUM_TOLERANCE {
        return Err(HmmError::InvalidParameters(format!(
            "{what} sums to {total}, expected 1"
        )));
    }
    Ok(())
}
