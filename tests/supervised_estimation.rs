use outcome_hmm::{HmmError, LabeledSequences, SupervisedEstimator};
use proptest::prelude::*;

fn assert_stochastic(hmm: &outcome_hmm::HmmParams) {
    assert!((hmm.initial().iter().sum::<f64>() - 1.0).abs() < 1e-9);
    for s in 0..hmm.n_states() {
        assert!((hmm.transition().row(s).iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((hmm.emission().row(s).iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn alternating_states_recover_swap_matrix() {
    let states: Vec<Vec<usize>> = (0..20)
        .map(|k| (0..10).map(|t| (t + k) % 2).collect())
        .collect();
    let obs = states.clone();
    let data = LabeledSequences::new(states.into(), obs.into());

    let hmm = SupervisedEstimator::new(2)
        .with_smoothing(1e-9)
        .fit(&data)
        .unwrap();

    let a = hmm.transition();
    assert!(a.get(0, 0) < 1e-6);
    assert!((a.get(0, 1) - 1.0).abs() < 1e-6);
    assert!((a.get(1, 0) - 1.0).abs() < 1e-6);
    assert!(a.get(1, 1) < 1e-6);
    assert!((hmm.initial()[0] - 0.5).abs() < 1e-6);
    assert!(hmm.transition().as_slice().iter().all(|&p| p > 0.0));
    assert_stochastic(&hmm);
}

#[test]
fn empty_input_cannot_infer_symbols() {
    let data = LabeledSequences::default();
    assert!(matches!(
        SupervisedEstimator::new(2).fit(&data),
        Err(HmmError::Estimation(_))
    ));
}

#[test]
fn empty_sequences_contribute_nothing() {
    let with_empty = LabeledSequences::new(
        vec![vec![1, 0], vec![]].into(),
        vec![vec![1, 0], vec![]].into(),
    );
    let without = LabeledSequences::new(vec![vec![1, 0]].into(), vec![vec![1, 0]].into());
    let est = SupervisedEstimator::new(2);
    assert_eq!(est.fit(&with_empty).unwrap(), est.fit(&without).unwrap());
}

fn labeled_sequences() -> impl Strategy<Value = Vec<(Vec<usize>, Vec<usize>)>> {
    prop::collection::vec(
        (
            prop::collection::vec(0usize..3, 0..12),
            prop::collection::vec(0usize..4, 0..12),
        ),
        1..6,
    )
}

proptest! {
    #[test]
    fn fitted_tables_are_strictly_positive_distributions(
        pairs in labeled_sequences(),
        smoothing in 0.01f64..2.0,
    ) {
        let mut data = LabeledSequences::default();
        for (s, o) in pairs {
            data.push(s, o);
        }
        let hmm = SupervisedEstimator::new(3)
            .with_n_symbols(4)
            .with_smoothing(smoothing)
            .fit(&data)
            .unwrap();
        prop_assert!((hmm.initial().iter().sum::<f64>() - 1.0).abs() < 1e-9);
        for s in 0..3 {
            prop_assert!((hmm.transition().row(s).iter().sum::<f64>() - 1.0).abs() < 1e-9);
            prop_assert!((hmm.emission().row(s).iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        prop_assert!(hmm.initial().iter().all(|&p| p > 0.0));
        prop_assert!(hmm.transition().as_slice().iter().all(|&p| p > 0.0));
        prop_assert!(hmm.emission().as_slice().iter().all(|&p| p > 0.0));
    }
}
