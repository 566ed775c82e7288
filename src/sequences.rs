//! Sequence containers: the unit of work for every estimator and decoder.
//!
//! Sequences are independent and may have any length, including zero.
//! Observation codes live in `[0, n_symbols)`; state codes in `[0, n_states)`.

use std::collections::BTreeMap;

use crate::error::{HmmError, Result};

/// Collection of independent integer-coded sequences.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceSet {
    sequences: Vec<Vec<usize>>,
}

impl SequenceSet {
    pub fn new(sequences: Vec<Vec<usize>>) -> Self {
        Self { sequences }
    }

    pub fn push(&mut self, sequence: Vec<usize>) {
        self.sequences.push(sequence);
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Total number of time steps across all sequences.
    pub fn total_steps(&self) -> usize {
        self.sequences.iter().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.sequences.iter().map(Vec::as_slice)
    }

    /// Sequences with at least one time step.
    pub fn non_empty(&self) -> impl Iterator<Item = &[usize]> {
        self.iter().filter(|s| !s.is_empty())
    }

    pub fn as_slice(&self) -> &[Vec<usize>] {
        &self.sequences
    }

    /// Largest code present, or `None` when every sequence is empty.
    pub fn max_symbol(&self) -> Option<usize> {
        self.iter().flat_map(|s| s.iter().copied()).max()
    }

    /// Alphabet size as one plus the largest code present.
    ///
    /// # Errors
    /// `Estimation` when no sequence has any element.
    pub fn infer_n_symbols(&self) -> Result<usize> {
        self.max_symbol().map(|m| m + 1).ok_or_else(|| {
            HmmError::Estimation("no observations provided to infer the symbol count".into())
        })
    }

    /// Return the supplied symbol count, or infer it from the data.
    pub fn resolve_n_symbols(&self, declared: Option<usize>) -> Result<usize> {
        match declared {
            Some(0) => Err(HmmError::Estimation("symbol count must be positive".into())),
            Some(n) => Ok(n),
            None => self.infer_n_symbols(),
        }
    }

    /// Verify every code lies below `bound`.
    pub fn check_bound(&self, what: &'static str, bound: usize) -> Result<()> {
        for seq in &self.sequences {
            if let Some(t) = seq.iter().position(|&v| v >= bound) {
                return Err(HmmError::out_of_range(what, t, seq[t], bound));
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> Vec<Vec<usize>> {
        self.sequences
    }
}

impl From<Vec<Vec<usize>>> for SequenceSet {
    fn from(sequences: Vec<Vec<usize>>) -> Self {
        Self::new(sequences)
    }
}

impl FromIterator<Vec<usize>> for SequenceSet {
    fn from_iter<I: IntoIterator<Item = Vec<usize>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Aligned state/observation sequence pairs for supervised training and
/// evaluation. Paired sequences may differ in length; consumers truncate to
/// the shorter one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabeledSequences {
    pub states: SequenceSet,
    pub observations: SequenceSet,
}

impl LabeledSequences {
    pub fn new(states: SequenceSet, observations: SequenceSet) -> Self {
        Self {
            states,
            observations,
        }
    }

    pub fn push(&mut self, states: Vec<usize>, observations: Vec<usize>) {
        self.states.push(states);
        self.observations.push(observations);
    }

    /// Number of pairs (the shorter of the two collections).
    pub fn len(&self) -> usize {
        self.states.len().min(self.observations.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pairs truncated to their common length.
    pub fn aligned(&self) -> impl Iterator<Item = (&[usize], &[usize])> {
        self.states.iter().zip(self.observations.iter()).map(|(s, o)| {
            let t = s.len().min(o.len());
            (&s[..t], &o[..t])
        })
    }
}

/// One team's ordered season: outcome states and discretised observations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeamSeason {
    pub team: String,
    pub states: Vec<usize>,
    pub observations: Vec<usize>,
}

/// Train/test partition produced by [`SeasonCorpus::split_holdout`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HoldoutSplit {
    pub train: LabeledSequences,
    pub test: LabeledSequences,
    /// Season of each training pair, index-aligned with `train`.
    pub train_seasons: Vec<i32>,
    /// Season of each test pair, index-aligned with `test`.
    pub test_seasons: Vec<i32>,
}

/// Season-keyed collection of per-team sequences, as handed over by the
/// upstream discretisation step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeasonCorpus {
    seasons: BTreeMap<i32, Vec<TeamSeason>>,
}

impl SeasonCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, season: i32, team: TeamSeason) {
        self.seasons.entry(season).or_default().push(team);
    }

    pub fn seasons(&self) -> impl Iterator<Item = i32> + '_ {
        self.seasons.keys().copied()
    }

    pub fn teams(&self, season: i32) -> &[TeamSeason] {
        self.seasons.get(&season).map_or(&[], Vec::as_slice)
    }

    /// Number of team-seasons across all seasons.
    pub fn len(&self) -> usize {
        self.seasons.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Route every non-empty team-season to test when its season is listed in
    /// `holdout`, otherwise to train. Seasons iterate in ascending order.
    pub fn split_holdout(&self, holdout: &[i32]) -> HoldoutSplit {
        let mut split = HoldoutSplit::default();
        for (&season, teams) in &self.seasons {
            let to_test = holdout.contains(&season);
            for team in teams.iter().filter(|t| !t.states.is_empty()) {
                let (pairs, seasons) = if to_test {
                    (&mut split.test, &mut split.test_seasons)
                } else {
                    (&mut split.train, &mut split.train_seasons)
                };
                pairs.push(team.states.clone(), team.observations.clone());
                seasons.push(season);
            }
        }
        split
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_symbol_count_across_sequences() {
        let set = SequenceSet::new(vec![vec![0, 2], vec![], vec![4, 1]]);
        assert_eq!(set.infer_n_symbols().unwrap(), 5);
        assert_eq!(set.resolve_n_symbols(Some(9)).unwrap(), 9);
        assert_eq!(set.total_steps(), 4);
        assert_eq!(set.non_empty().count(), 2);
    }

    #[test]
    fn all_empty_cannot_infer() {
        let set = SequenceSet::new(vec![vec![], vec![]]);
        assert!(matches!(set.infer_n_symbols(), Err(HmmError::Estimation(_))));
        assert!(matches!(
            SequenceSet::default().resolve_n_symbols(None),
            Err(HmmError::Estimation(_))
        ));
    }

    #[test]
    fn aligned_pairs_truncate_to_shorter() {
        let pairs = LabeledSequences::new(
            vec![vec![1, 0, 1], vec![0]].into(),
            vec![vec![2, 2], vec![1, 1, 1]].into(),
        );
        let got: Vec<_> = pairs.aligned().map(|(s, o)| (s.len(), o.len())).collect();
        assert_eq!(got, vec![(2, 2), (1, 1)]);
    }

    #[test]
    fn holdout_split_routes_by_season_and_skips_empty() {
        let mut corpus = SeasonCorpus::new();
        let team = |name: &str, states: Vec<usize>| TeamSeason {
            team: name.into(),
            observations: states.clone(),
            states,
        };
        corpus.insert(2017, team("BOS", vec![1, 0]));
        corpus.insert(2018, team("LAL", vec![0, 0, 1]));
        corpus.insert(2018, team("NYK", vec![]));
        corpus.insert(2019, team("MIA", vec![1]));

        let split = corpus.split_holdout(&[2018]);
        assert_eq!(split.train.len(), 2);
        assert_eq!(split.test.len(), 1);
        assert_eq!(split.train_seasons, vec![2017, 2019]);
        assert_eq!(split.test_seasons, vec![2018]);
        assert_eq!(split.test.states.as_slice(), &[vec![0, 0, 1]]);
        assert_eq!(corpus.len(), 4);
    }
}
