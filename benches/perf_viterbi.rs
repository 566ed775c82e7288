use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use outcome_hmm::{decode, decode_batch, HmmParams, SequenceSet};
use rand::{rngs::StdRng, SeedableRng};
use sysinfo::{get_current_pid, ProcessRefreshKind, System};

fn demo_hmm() -> HmmParams {
    HmmParams::from_rows(
        vec![0.5, 0.5],
        &[vec![0.6, 0.4], vec![0.4, 0.6]],
        &[
            vec![0.35, 0.25, 0.2, 0.12, 0.08],
            vec![0.08, 0.12, 0.2, 0.25, 0.35],
        ],
    )
    .unwrap()
}

fn seasons(hmm: &HmmParams, teams: usize, games: usize, seed: u64) -> SequenceSet {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..teams).map(|_| hmm.sample(games, &mut rng).1).collect()
}

fn rss_kib() -> u64 {
    let mut sys = System::new();
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    get_current_pid()
        .ok()
        .and_then(|pid| sys.process(pid).map(|p| p.memory()))
        .unwrap_or(0)
}

fn bench_decode_batch(c: &mut Criterion) {
    let hmm = demo_hmm();
    let mut group = c.benchmark_group("viterbi_decode_batch");
    for &teams in &[30usize, 300, 3_000] {
        group.bench_function(format!("teams_{teams}_games_82"), |b| {
            b.iter_batched(
                || seasons(&hmm, teams, 82, 44),
                |set| {
                    let before = rss_kib();
                    let paths = decode_batch(&hmm, &set).unwrap();
                    let after = rss_kib();
                    criterion::black_box(paths);
                    eprintln!(
                        "RSS KiB delta (decode_batch {teams}): {}",
                        after.saturating_sub(before)
                    );
                },
                BatchSize::PerIteration,
            )
        });
    }
    group.finish();
}

fn bench_decode_long(c: &mut Criterion) {
    let hmm = demo_hmm();
    let mut group = c.benchmark_group("viterbi_decode_long");
    for &len in &[10_000usize, 50_000] {
        group.bench_function(format!("len_{len}"), |b| {
            b.iter_batched(
                || seasons(&hmm, 1, len, 45).into_inner().remove(0),
                |obs| criterion::black_box(decode(&hmm, &obs).unwrap().log_prob),
                BatchSize::PerIteration,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode_batch, bench_decode_long);
criterion_main!(benches);
