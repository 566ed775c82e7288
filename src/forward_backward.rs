//! Scaled forward-backward inference for one observation sequence.
//!
//! Forward probabilities are renormalised at every time step and the
//! normalisers kept as scale factors; the backward pass divides by the same
//! factors. Unscaled products shrink geometrically with sequence length and
//! underflow `f64` within a few hundred steps, while the scaled quantities
//! stay in `[0, 1]` and `log P(O) = sum_t ln(scale_t)`.

use crate::engine::TrellisEngine;
use crate::error::{HmmError, Result};
use crate::matrix::DenseMatrix;
use crate::params::HmmParams;
use crate::traits::Trellis;
use crate::utils::{floored, normalize_in_place, PROB_FLOOR};

/// Forward recurrence with per-step rescaling.
pub struct ScaledForward<'a> {
    params: &'a HmmParams,
    obs: &'a [usize],
}

/// One normalised forward column and the normaliser that produced it.
#[derive(Clone, Debug)]
pub struct ForwardColumn {
    pub alpha: Vec<f64>,
    pub scale: f64,
    /// `sum ln(scale)` over this and every earlier step.
    pub log_likelihood: f64,
}

impl<'a> ScaledForward<'a> {
    pub fn new(params: &'a HmmParams, obs: &'a [usize]) -> Self {
        Self { params, obs }
    }
}

impl Trellis for ScaledForward<'_> {
    type Frontier = ForwardColumn;

    fn num_layers(&self) -> usize {
        self.obs.len()
    }

    fn init_frontier(&self) -> ForwardColumn {
        let o0 = self.obs[0];
        let emission = self.params.emission();
        let mut alpha: Vec<f64> = self
            .params
            .initial()
            .iter()
            .enumerate()
            .map(|(s, &pi)| pi * emission.get(s, o0))
            .collect();
        let scale = normalize_in_place(&mut alpha);
        ForwardColumn {
            alpha,
            scale,
            log_likelihood: scale.ln(),
        }
    }

    fn forward_step(&self, layer: usize, prev: &ForwardColumn) -> ForwardColumn {
        let sym = self.obs[layer + 1];
        let n = self.params.n_states();
        let transition = self.params.transition();
        let emission = self.params.emission();
        let mut alpha = vec![0.0; n];
        for (from, &a_prev) in prev.alpha.iter().enumerate() {
            if a_prev == 0.0 {
                continue;
            }
            for (to, acc) in alpha.iter_mut().enumerate() {
                *acc += a_prev * transition.get(from, to);
            }
        }
        for (to, acc) in alpha.iter_mut().enumerate() {
            *acc *= emission.get(to, sym);
        }
        let scale = normalize_in_place(&mut alpha);
        ForwardColumn {
            alpha,
            scale,
            log_likelihood: prev.log_likelihood + scale.ln(),
        }
    }
}

/// Backward recurrence reusing the forward scale factors.
///
/// Layer `k` holds `beta` at time `T - 1 - k`.
pub struct ScaledBackward<'a> {
    params: &'a HmmParams,
    obs: &'a [usize],
    scales: &'a [f64],
}

impl<'a> ScaledBackward<'a> {
    pub fn new(params: &'a HmmParams, obs: &'a [usize], scales: &'a [f64]) -> Self {
        debug_assert_eq!(obs.len(), scales.len());
        Self {
            params,
            obs,
            scales,
        }
    }
}

impl Trellis for ScaledBackward<'_> {
    type Frontier = Vec<f64>;

    fn num_layers(&self) -> usize {
        self.obs.len()
    }

    fn init_frontier(&self) -> Vec<f64> {
        vec![1.0; self.params.n_states()]
    }

    fn forward_step(&self, layer: usize, beta_next: &Vec<f64>) -> Vec<f64> {
        let next_t = self.obs.len() - 1 - layer;
        let sym = self.obs[next_t];
        let scale = self.scales[next_t];
        let transition = self.params.transition();
        let emission = self.params.emission();

        let weighted: Vec<f64> = beta_next
            .iter()
            .enumerate()
            .map(|(to, &b)| emission.get(to, sym) * b)
            .collect();
        (0..self.params.n_states())
            .map(|from| {
                let total: f64 = transition
                    .row(from)
                    .iter()
                    .zip(&weighted)
                    .map(|(a, w)| a * w)
                    .sum();
                total / scale
            })
            .collect()
    }
}

/// Everything one forward-backward pass produces for a sequence of length `T`.
#[derive(Clone, Debug)]
pub struct Posteriors {
    /// Scaled forward probabilities, `n_states x T`.
    pub alpha: DenseMatrix,
    /// Scaled backward probabilities, `n_states x T`.
    pub beta: DenseMatrix,
    /// Per-step normalisers of the forward pass.
    pub scales: Vec<f64>,
    /// `log P(observations | model)`.
    pub log_likelihood: f64,
    /// State occupancy posteriors, `n_states x T`; every column sums to one.
    pub gamma: DenseMatrix,
    /// Expected transition counts summed over `t = 0..T-1`, `n_states x n_states`.
    pub xi: DenseMatrix,
}

impl Posteriors {
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }
}

/// Run the scaled forward-backward pass on one sequence.
///
/// # Errors
/// `EmptySequence` for `T == 0`; `DimensionMismatch` if a symbol is outside
/// the model's alphabet.
pub fn forward_backward(params: &HmmParams, obs: &[usize]) -> Result<Posteriors> {
    if obs.is_empty() {
        return Err(HmmError::EmptySequence);
    }
    params.check_observations(obs)?;

    let n = params.n_states();
    let t_len = obs.len();

    let forward = TrellisEngine::new(ScaledForward::new(params, obs)).run();
    let mut alpha = DenseMatrix::zeros(n, t_len);
    let mut scales = Vec::with_capacity(t_len);
    for (t, col) in forward.iter().enumerate() {
        alpha.set_column(t, &col.alpha);
        scales.push(col.scale);
    }

    let backward = TrellisEngine::new(ScaledBackward::new(params, obs, &scales)).run();
    let mut beta = DenseMatrix::zeros(n, t_len);
    for (layer, col) in backward.iter().enumerate() {
        beta.set_column(t_len - 1 - layer, col);
    }

    let log_likelihood = forward.last().map_or(0.0, |col| col.log_likelihood);

    let mut gamma = DenseMatrix::zeros(n, t_len);
    for t in 0..t_len {
        let mut col: Vec<f64> = (0..n).map(|s| alpha.get(s, t) * beta.get(s, t)).collect();
        let total = col.iter().sum::<f64>().max(PROB_FLOOR);
        col.iter_mut().for_each(|g| *g /= total);
        gamma.set_column(t, &col);
    }

    let xi = expected_transitions(params, obs, &alpha, &beta);

    Ok(Posteriors {
        alpha,
        beta,
        scales,
        log_likelihood,
        gamma,
        xi,
    })
}

/// Sum over `t` of the per-step normalised pairwise posteriors
/// `alpha[i,t] * A[i,j] * B[j,o(t+1)] * beta[j,t+1]`.
fn expected_transitions(
    params: &HmmParams,
    obs: &[usize],
    alpha: &DenseMatrix,
    beta: &DenseMatrix,
) -> DenseMatrix {
    let n = params.n_states();
    let transition = params.transition();
    let emission = params.emission();
    let mut accum = DenseMatrix::zeros(n, n);
    let mut step = DenseMatrix::zeros(n, n);

    for t in 0..obs.len().saturating_sub(1) {
        let sym = obs[t + 1];
        for i in 0..n {
            let a = alpha.get(i, t);
            for j in 0..n {
                step.set(i, j, a * transition.get(i, j) * emission.get(j, sym) * beta.get(j, t + 1));
            }
        }
        let total = floored(step.sum());
        for i in 0..n {
            for j in 0..n {
                accum.add_at(i, j, step.get(i, j) / total);
            }
        }
    }
    accum
}

/// Sequence log-likelihood from the scaled forward pass alone.
///
/// A zero-length sequence has log-likelihood `0.0`.
pub fn log_likelihood(params: &HmmParams, obs: &[usize]) -> Result<f64> {
    params.check_observations(obs)?;
    let last = TrellisEngine::new(ScaledForward::new(params, obs)).run_final();
    Ok(last.map_or(0.0, |col| col.log_likelihood))
}
