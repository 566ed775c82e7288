//! Core trait for layered recurrences over an observation sequence.
//!
//! The forward pass, the backward pass and Viterbi are all the same shape:
//! a frontier of per-state values at time step `t` is mapped to the frontier
//! at `t + 1` using only the fixed model and the observation at `t + 1`.
//! Implement [`Trellis`] for that step and let
//! [`TrellisEngine`](crate::engine::TrellisEngine) drive the sweep.

/// A layered dynamic program with one frontier per time step.
///
/// Semantics:
/// - There are `num_layers()` frontiers, indexed `0..num_layers()`.
/// - `init_frontier()` produces layer 0.
/// - `forward_step(i, frontier_i)` maps layer `i` to layer `i + 1`.
///
/// A recurrence that runs backwards in time (such as the backward pass)
/// simply maps its layer index to `T - 1 - layer` internally.
pub trait Trellis {
    /// Per-layer state: a column of per-state values plus any bookkeeping.
    type Frontier;

    /// Number of layers (time steps) `T`.
    fn num_layers(&self) -> usize;

    /// Frontier at layer 0. Only called when `num_layers() > 0`.
    fn init_frontier(&self) -> Self::Frontier;

    /// One step from layer `layer` to `layer + 1`.
    ///
    /// Must depend only on `frontier` and fixed problem data.
    fn forward_step(&self, layer: usize, frontier: &Self::Frontier) -> Self::Frontier;
}
