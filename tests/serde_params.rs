#![cfg(feature = "serde")]

use outcome_hmm::{BaumWelch, HmmParams, SequenceSet};

#[test]
fn fitted_model_survives_json() {
    let data = SequenceSet::new(vec![vec![0, 1, 2, 1, 0], vec![2, 2, 1]]);
    let fit = BaumWelch::builder(2)
        .with_max_iters(3)
        .build()
        .unwrap()
        .fit(&data)
        .unwrap();

    let json = serde_json::to_string(&fit.params).unwrap();
    let restored: HmmParams = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.n_states(), 2);
    assert_eq!(restored.n_symbols(), 3);
    for (a, b) in restored.emission().as_slice().iter().zip(fit.params.emission().as_slice()) {
        assert!((a - b).abs() < 1e-12);
    }
}
