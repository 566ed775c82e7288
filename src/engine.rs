//! Trellis sweep driver and the data-parallel map over sequences.
//!
//! [`TrellisEngine`] runs any [`Trellis`] across all of its layers and keeps
//! every frontier, which the forward-backward pass and Viterbi backtracking
//! both need. [`map_sequences`] fans independent per-sequence work out over
//! rayon when the `parallel` feature is enabled and falls back to a plain
//! iterator otherwise; results always come back in input order.

use crate::traits::Trellis;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Sweep driver for a [`Trellis`] instance `P`.
///
/// ```
/// use outcome_hmm::engine::TrellisEngine;
/// use outcome_hmm::traits::Trellis;
///
/// struct Counter(usize);
/// impl Trellis for Counter {
///     type Frontier = usize;
///     fn num_layers(&self) -> usize { self.0 }
///     fn init_frontier(&self) -> usize { 0 }
///     fn forward_step(&self, _layer: usize, f: &usize) -> usize { f + 1 }
/// }
///
/// let layers = TrellisEngine::new(Counter(4)).run();
/// assert_eq!(layers, vec![0, 1, 2, 3]);
/// ```
pub struct TrellisEngine<P: Trellis> {
    problem: P,
}

impl<P: Trellis> TrellisEngine<P> {
    pub fn new(problem: P) -> Self {
        Self { problem }
    }

    /// Run the recurrence over every layer, returning all frontiers.
    ///
    /// The result has exactly `num_layers()` entries and is empty for a
    /// zero-layer problem.
    pub fn run(&self) -> Vec<P::Frontier> {
        let t = self.problem.num_layers();
        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!("trellis_sweep", layers = t);
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let mut frontiers = Vec::with_capacity(t);
        if t == 0 {
            return frontiers;
        }
        let mut frontier = self.problem.init_frontier();
        for layer in 0..t - 1 {
            let next = self.problem.forward_step(layer, &frontier);
            frontiers.push(frontier);
            frontier = next;
        }
        frontiers.push(frontier);
        frontiers
    }

    /// Run the recurrence keeping only the last frontier.
    pub fn run_final(&self) -> Option<P::Frontier> {
        let t = self.problem.num_layers();
        #[cfg(feature = "tracing")]
        let span = tracing::trace_span!("trellis_sweep", layers = t, keep = "final");
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        if t == 0 {
            return None;
        }
        let mut frontier = self.problem.init_frontier();
        for layer in 0..t - 1 {
            frontier = self.problem.forward_step(layer, &frontier);
        }
        Some(frontier)
    }
}

/// Apply `f` to every item, in parallel when the `parallel` feature is on.
///
/// Output order matches input order, so any reduction performed by the
/// caller over the result is deterministic.
#[cfg(feature = "parallel")]
pub fn map_sequences<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.par_iter().map(f).collect()
}

/// Apply `f` to every item, in parallel when the `parallel` feature is on.
///
/// Output order matches input order, so any reduction performed by the
/// caller over the result is deterministic.
#[cfg(not(feature = "parallel"))]
pub fn map_sequences<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    F: Fn(&T) -> R,
{
    items.iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubling {
        layers: usize,
    }

    impl Trellis for Doubling {
        type Frontier = Vec<u64>;
        fn num_layers(&self) -> usize {
            self.layers
        }
        fn init_frontier(&self) -> Self::Frontier {
            vec![1, 2]
        }
        fn forward_step(&self, _layer: usize, f: &Self::Frontier) -> Self::Frontier {
            f.iter().map(|x| x * 2).collect()
        }
    }

    #[test]
    fn zero_layers_no_op() {
        let engine = TrellisEngine::new(Doubling { layers: 0 });
        assert!(engine.run().is_empty());
        assert!(engine.run_final().is_none());
    }

    #[test]
    fn keeps_every_frontier() {
        let engine = TrellisEngine::new(Doubling { layers: 3 });
        let all = engine.run();
        assert_eq!(all, vec![vec![1, 2], vec![2, 4], vec![4, 8]]);
        assert_eq!(engine.run_final(), Some(vec![4, 8]));
    }

    /// Frontier without `Clone`; the engine only moves frontiers.
    #[derive(Debug, PartialEq)]
    struct Owned(Vec<u64>);

    struct Summing;

    impl Trellis for Summing {
        type Frontier = Owned;
        fn num_layers(&self) -> usize {
            4
        }
        fn init_frontier(&self) -> Owned {
            Owned(vec![1])
        }
        fn forward_step(&self, layer: usize, f: &Owned) -> Owned {
            Owned(vec![f.0[0] + layer as u64])
        }
    }

    #[test]
    fn frontiers_need_not_be_clone() {
        let engine = TrellisEngine::new(Summing);
        let all = engine.run();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3], Owned(vec![4]));
        assert_eq!(engine.run_final(), Some(Owned(vec![4])));
    }

    #[test]
    fn map_preserves_order() {
        let items: Vec<usize> = (0..100).collect();
        let squared = map_sequences(&items, |x| x * x);
        assert_eq!(squared[7], 49);
        assert_eq!(squared.len(), 100);
    }
}
