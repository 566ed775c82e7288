#![cfg(feature = "heavy")]

use outcome_hmm::{decode_batch, BaumWelch, HmmParams, SequenceSet, SupervisedEstimator};
use rand::{rngs::StdRng, SeedableRng};

fn truth() -> HmmParams {
    HmmParams::from_rows(
        vec![0.5, 0.5],
        &[vec![0.7, 0.3], vec![0.35, 0.65]],
        &[
            vec![0.3, 0.25, 0.2, 0.15, 0.1],
            vec![0.1, 0.15, 0.2, 0.25, 0.3],
        ],
    )
    .unwrap()
}

#[test]
fn many_long_seasons() {
    let hmm = truth();
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let (states, obs): (Vec<_>, Vec<_>) = (0..2_000).map(|_| hmm.sample(1_000, &mut rng)).unzip();
    let states = SequenceSet::new(states);
    let obs = SequenceSet::new(obs);

    let supervised = SupervisedEstimator::new(2).fit_sequences(&states, &obs).unwrap();
    let paths = decode_batch(&supervised, &obs).unwrap();
    assert_eq!(paths.len(), 2_000);
    assert!(paths.iter().all(|p| p.len() == 1_000));

    let fit = BaumWelch::builder(2)
        .with_max_iters(10)
        .build()
        .unwrap()
        .fit(&obs)
        .unwrap();
    assert!(fit.log_likelihoods.iter().all(|ll| ll.is_finite()));
}
