use crate::baum_welch::BaumWelch;
use crate::error::{HmmError, Result};

/// Default pseudocount added to every expected-count cell in the M-step.
pub const DEFAULT_EM_SMOOTHING: f64 = 1e-3;
/// Default iteration budget.
pub const DEFAULT_MAX_ITERS: usize = 50;
/// Default absolute change in total log-likelihood that counts as converged.
pub const DEFAULT_TOLERANCE: f64 = 1e-3;

/// Fluent configuration for [`BaumWelch`].
#[derive(Clone, Debug)]
pub struct BaumWelchBuilder {
    n_states: usize,
    n_symbols: Option<usize>,
    smoothing: f64,
    max_iters: usize,
    tolerance: f64,
    seed: u64,
}

impl BaumWelchBuilder {
    pub fn new(n_states: usize) -> Self {
        Self {
            n_states,
            n_symbols: None,
            smoothing: DEFAULT_EM_SMOOTHING,
            max_iters: DEFAULT_MAX_ITERS,
            tolerance: DEFAULT_TOLERANCE,
            seed: 0,
        }
    }
    pub fn with_n_symbols(mut self, n_symbols: usize) -> Self {
        self.n_symbols = Some(n_symbols);
        self
    }
    pub fn with_smoothing(mut self, smoothing: f64) -> Self {
        self.smoothing = smoothing;
        self
    }
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
    pub fn build(self) -> Result<BaumWelch> {
        if self.n_states == 0 {
            return Err(HmmError::Estimation("state count must be positive".into()));
        }
        if !self.smoothing.is_finite() || self.smoothing < 0.0 {
            return Err(HmmError::InvalidConfig(format!(
                "smoothing must be a non-negative finite number, got {}",
                self.smoothing
            )));
        }
        if self.max_iters == 0 {
            return Err(HmmError::InvalidConfig("max_iters must be at least 1".into()));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(HmmError::InvalidConfig(format!(
                "tolerance must be a non-negative finite number, got {}",
                self.tolerance
            )));
        }
        Ok(BaumWelch {
            n_states: self.n_states,
            n_symbols: self.n_symbols,
            smoothing: self.smoothing,
            max_iters: self.max_iters,
            tolerance: self.tolerance,
            seed: self.seed,
        })
    }
}
