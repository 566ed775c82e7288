//! Example: fit both estimators on synthetic seasons and decode a held-out one.
//!
//! Run with:
//! `cargo run --example season_decode`

use outcome_hmm::{
    decode, sequence_accuracy, BaumWelch, HmmParams, SeasonCorpus, StateLabelMap,
    SupervisedEstimator, TeamSeason,
};
use rand::{rngs::StdRng, SeedableRng};

fn main() -> outcome_hmm::Result<()> {
    // States: 0 = loss, 1 = win
    // Observations: performance bins 0 (poor) .. 2 (strong)
    let truth = HmmParams::from_rows(
        vec![0.5, 0.5],
        &[vec![0.65, 0.35], vec![0.35, 0.65]],
        &[vec![0.6, 0.3, 0.1], vec![0.1, 0.3, 0.6]],
    )?;

    let mut rng = StdRng::seed_from_u64(1);
    let mut corpus = SeasonCorpus::new();
    for season in 2019..=2022 {
        for team in ["BOS", "DEN", "LAL", "MIA", "NYK", "PHX"] {
            let (states, observations) = truth.sample(82, &mut rng);
            corpus.insert(
                season,
                TeamSeason {
                    team: team.to_string(),
                    states,
                    observations,
                },
            );
        }
    }
    let split = corpus.split_holdout(&[2022]);

    let supervised = SupervisedEstimator::new(2).with_n_symbols(3).fit(&split.train)?;
    let fit = BaumWelch::builder(2)
        .with_n_symbols(3)
        .with_max_iters(100)
        .build()?
        .fit(&split.train.observations)?;
    println!(
        "Baum-Welch: {} iterations, converged = {}",
        fit.iterations, fit.converged
    );

    let train_hidden: Vec<Vec<usize>> = split
        .train
        .observations
        .iter()
        .map(|obs| decode(&fit.params, obs).map(|d| d.path))
        .collect::<Result<_, _>>()?;
    let map = StateLabelMap::fit(&train_hidden, split.train.states.as_slice(), 2, None)?;

    let team = &corpus.teams(2022)[0];
    let sup = decode(&supervised, &team.observations)?;
    let unsup = map.apply(&decode(&fit.params, &team.observations)?.path)?;

    println!("{} 2022, first 20 games:", team.team);
    println!("  observed  {:?}", &team.observations[..20]);
    println!("  actual    {:?}", &team.states[..20]);
    println!("  supervised{:?}", &sup.path[..20]);
    println!("  mapped EM {:?}", &unsup[..20]);
    println!(
        "Season accuracy: supervised {:.3}, mapped EM {:.3}",
        sequence_accuracy(&[&team.states], &[&sup.path]),
        sequence_accuracy(&[&team.states], &[&unsup]),
    );
    Ok(())
}
