//! Discrete-emission hidden Markov models for game-outcome sequences.
//!
//! Each team-season is a sequence of games. The hidden state is the outcome
//! (loss = 0, win = 1, or unlabeled states when trained without outcomes)
//! and the observation is a discretised performance symbol produced by an
//! upstream bucketing step.
//!
//! ## Pipeline
//! 1. Collect sequences in a [`SequenceSet`] / [`LabeledSequences`]
//!    (optionally via [`SeasonCorpus::split_holdout`]).
//! 2. Fit parameters, either supervised with [`SupervisedEstimator`] or
//!    unsupervised with [`BaumWelch`], whose E-step is the scaled
//!    [`forward_backward`] pass.
//! 3. Decode the most probable state paths with [`decode`] /
//!    [`decode_batch`].
//! 4. Score with [`sequence_accuracy`], relabelling unsupervised states
//!    through a [`StateLabelMap`] first.
//!
//! The forward pass, backward pass and Viterbi share one abstraction: a
//! [`Trellis`] mapping the per-state frontier at time `t` to time `t + 1`,
//! swept by [`TrellisEngine`].
//!
//! ## Quick start
//! ```
//! use outcome_hmm::{decode_batch, sequence_accuracy, LabeledSequences, SupervisedEstimator};
//!
//! let train = LabeledSequences::new(
//!     vec![vec![1, 1, 0, 1], vec![0, 0, 1]].into(),
//!     vec![vec![2, 2, 0, 2], vec![0, 1, 2]].into(),
//! );
//! let hmm = SupervisedEstimator::new(2).fit(&train).unwrap();
//! let paths = decode_batch(&hmm, &train.observations).unwrap();
//! assert_eq!(paths[0].len(), 4);
//! let acc = sequence_accuracy(train.states.as_slice(), &paths);
//! assert!((0.0..=1.0).contains(&acc));
//! ```
//!
//! ## Features
//! - `parallel` (default): per-sequence work runs on rayon.
//! - `tracing` (default): spans and events through `tracing`.
//! - `serde`: `Serialize`/`Deserialize` for fitted parameters.

pub mod baum_welch;
pub mod builder;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod forward_backward;
pub mod matrix;
pub mod params;
pub mod sequences;
pub mod supervised;
pub mod traits;
pub mod utils;
pub mod viterbi;

pub use crate::baum_welch::{BaumWelch, BaumWelchFit, SufficientStats};
pub use crate::builder::BaumWelchBuilder;
pub use crate::engine::TrellisEngine;
pub use crate::error::{HmmError, Result};
pub use crate::evaluate::{sequence_accuracy, StateLabelMap};
pub use crate::forward_backward::{forward_backward, Posteriors};
pub use crate::matrix::DenseMatrix;
pub use crate::params::HmmParams;
pub use crate::sequences::{HoldoutSplit, LabeledSequences, SeasonCorpus, SequenceSet, TeamSeason};
pub use crate::supervised::SupervisedEstimator;
pub use crate::traits::Trellis;
pub use crate::viterbi::{decode, decode_batch, Decoded, LogHmm};
