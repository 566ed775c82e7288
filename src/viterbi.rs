//! Viterbi decoding in log space.
//!
//! Raw path probabilities over a full season (~82 steps) underflow `f64`,
//! so the recursion adds log-probabilities instead of multiplying. Ties
//! between predecessors, and between terminal states, go to the lowest
//! state index.

use crate::engine::{map_sequences, TrellisEngine};
use crate::error::{HmmError, Result};
use crate::params::HmmParams;
use crate::sequences::SequenceSet;
use crate::traits::Trellis;
use crate::utils::argmax_first;

/// Log-space view of an [`HmmParams`]; zero probabilities become `-inf`.
#[derive(Clone, Debug)]
pub struct LogHmm {
    /// Number of states.
    pub n_states: usize,
    /// Number of observation symbols.
    pub n_symbols: usize,
    /// log initial probabilities [s]
    pub log_pi: Vec<f64>,
    /// log transition probabilities [s_from][s_to]
    pub log_a: Vec<Vec<f64>>,
    /// log emission probabilities [s][obs_symbol]
    pub log_b: Vec<Vec<f64>>,
}

impl From<&HmmParams> for LogHmm {
    fn from(params: &HmmParams) -> Self {
        let n = params.n_states();
        let ln_row = |row: &[f64]| row.iter().map(|p| p.ln()).collect::<Vec<_>>();
        Self {
            n_states: n,
            n_symbols: params.n_symbols(),
            log_pi: ln_row(params.initial()),
            log_a: (0..n).map(|s| ln_row(params.transition().row(s))).collect(),
            log_b: (0..n).map(|s| ln_row(params.emission().row(s))).collect(),
        }
    }
}

/// Viterbi DP instance: fixed log-space HMM + observation sequence.
pub struct ViterbiProblem<'a> {
    pub hmm: &'a LogHmm,
    /// Observations as discrete symbols in 0..n_symbols.
    pub obs: &'a [usize],
}

#[derive(Clone, Debug)]
pub struct VitFrontier {
    /// log-probability of best path ending in each state at time t.
    pub log_delta: Vec<f64>,
    /// Best predecessor of each state at time t (unused at t = 0).
    pub backpointer: Vec<usize>,
}

impl Trellis for ViterbiProblem<'_> {
    type Frontier = VitFrontier;

    fn num_layers(&self) -> usize {
        self.obs.len()
    }

    fn init_frontier(&self) -> VitFrontier {
        let o0 = self.obs[0];
        let log_delta = (0..self.hmm.n_states)
            .map(|s| self.hmm.log_pi[s] + self.hmm.log_b[s][o0])
            .collect();
        VitFrontier {
            log_delta,
            backpointer: vec![0; self.hmm.n_states],
        }
    }

    fn forward_step(&self, layer: usize, f: &VitFrontier) -> VitFrontier {
        let sym = self.obs[layer + 1];
        let n = self.hmm.n_states;
        let mut log_delta = vec![f64::NEG_INFINITY; n];
        let mut backpointer = vec![0usize; n];
        for s_to in 0..n {
            let mut best = f64::NEG_INFINITY;
            let mut arg = 0;
            for s_from in 0..n {
                let cand = f.log_delta[s_from] + self.hmm.log_a[s_from][s_to];
                if cand > best {
                    best = cand;
                    arg = s_from;
                }
            }
            log_delta[s_to] = best + self.hmm.log_b[s_to][sym];
            backpointer[s_to] = arg;
        }
        VitFrontier {
            log_delta,
            backpointer,
        }
    }
}

/// Most probable state path and its joint log-probability with the observations.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub path: Vec<usize>,
    pub log_prob: f64,
}

impl LogHmm {
    /// Decode one non-empty sequence.
    ///
    /// # Errors
    /// `EmptySequence` for a zero-length input; `DimensionMismatch` for a
    /// symbol outside the alphabet.
    pub fn decode(&self, obs: &[usize]) -> Result<Decoded> {
        if obs.is_empty() {
            return Err(HmmError::EmptySequence);
        }
        if let Some(t) = obs.iter().position(|&o| o >= self.n_symbols) {
            return Err(HmmError::out_of_range("symbol", t, obs[t], self.n_symbols));
        }

        let frontiers = TrellisEngine::new(ViterbiProblem { hmm: self, obs }).run();
        let last = &frontiers[frontiers.len() - 1];
        let mut state = argmax_first(&last.log_delta);
        let log_prob = last.log_delta[state];

        let mut path = vec![0usize; obs.len()];
        for t in (0..obs.len()).rev() {
            path[t] = state;
            state = frontiers[t].backpointer[state];
        }
        Ok(Decoded { path, log_prob })
    }
}

/// Decode one non-empty sequence under `params`.
pub fn decode(params: &HmmParams, obs: &[usize]) -> Result<Decoded> {
    LogHmm::from(params).decode(obs)
}

/// Decode every sequence; empty inputs yield empty paths.
///
/// Sequences are independent and are decoded in parallel when the
/// `parallel` feature is enabled. Output order matches input order.
pub fn decode_batch(params: &HmmParams, sequences: &SequenceSet) -> Result<Vec<Vec<usize>>> {
    let hmm = LogHmm::from(params);
    map_sequences(sequences.as_slice(), |obs| {
        if obs.is_empty() {
            Ok(Vec::new())
        } else {
            hmm.decode(obs).map(|d| d.path)
        }
    })
    .into_iter()
    .collect()
}
