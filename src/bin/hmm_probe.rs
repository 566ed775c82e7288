use std::env;
use std::time::Instant;

use outcome_hmm::{
    decode_batch, sequence_accuracy, BaumWelch, HmmParams, HoldoutSplit, SeasonCorpus,
    StateLabelMap, SupervisedEstimator, TeamSeason,
};
use rand::{rngs::StdRng, SeedableRng};
use sysinfo::{get_current_pid, ProcessRefreshKind, System};
use tracing_subscriber::EnvFilter;

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("hmm_probe: {err}");
            Options::print_help();
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    eprintln!("\n{}", "=".repeat(80));
    eprintln!("Outcome HMM probe: synthetic seasons, both estimators, hold-out accuracy");
    eprintln!("{}", "=".repeat(80));
    eprintln!(
        "  seasons={} teams={} games={} bins={} holdout={} seed={} max_iters={}",
        options.seasons,
        options.teams,
        options.games,
        options.bins,
        options.holdout,
        options.seed,
        options.max_iters
    );
    eprintln!();

    let truth = match ground_truth(options.bins) {
        Ok(hmm) => hmm,
        Err(err) => {
            eprintln!("hmm_probe: {err}");
            std::process::exit(2);
        }
    };
    let corpus = synthetic_corpus(&truth, &options);
    let holdout: Vec<i32> = corpus
        .seasons()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .take(options.holdout)
        .collect();
    let split = corpus.split_holdout(&holdout);
    eprintln!(
        "  train sequences={} test sequences={} (held-out seasons {:?})",
        split.train.len(),
        split.test.len(),
        holdout
    );
    eprintln!();

    let mut sys = System::new();
    let size_desc = format!("train={},test={}", split.train.len(), split.test.len());
    let mut measurements = Vec::new();

    eprintln!("[1/3] Decoding with the generating parameters...");
    measurements.push(run_oracle(&truth, &split, &size_desc, &mut sys));
    eprintln!("[2/3] Supervised estimation...");
    measurements.push(run_supervised(&options, &split, &size_desc, &mut sys));
    eprintln!("[3/3] Baum-Welch estimation with label mapping...");
    measurements.push(run_baum_welch(&options, &split, &size_desc, &mut sys));

    print_summary(&measurements);

    if let Err(err) = options.format.write(&measurements) {
        eprintln!("hmm_probe output error: {err}");
        std::process::exit(1);
    }
}

struct Options {
    format: OutputFormat,
    seasons: usize,
    teams: usize,
    games: usize,
    bins: usize,
    holdout: usize,
    seed: u64,
    max_iters: usize,
}

impl Options {
    fn parse<I, T>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut options = Options {
            format: OutputFormat::Csv,
            seasons: 6,
            teams: 30,
            games: 82,
            bins: 5,
            holdout: 1,
            seed: 2024,
            max_iters: 100,
        };

        while let Some(arg) = args.next() {
            let arg: String = arg.into();
            if arg == "--help" || arg == "-h" {
                Options::print_help();
                std::process::exit(0);
            }
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg.clone(), None),
            };
            let mut value = || -> Result<String, String> {
                match &inline {
                    Some(v) => Ok(v.clone()),
                    None => args
                        .next()
                        .map(Into::into)
                        .ok_or_else(|| format!("missing value after {flag}")),
                }
            };
            match flag.as_str() {
                "--format" => options.format = OutputFormat::from_str(&value()?)?,
                "--seasons" => options.seasons = parse_count("--seasons", &value()?)?,
                "--teams" => options.teams = parse_count("--teams", &value()?)?,
                "--games" => options.games = parse_count("--games", &value()?)?,
                "--bins" => options.bins = parse_count("--bins", &value()?)?,
                "--holdout" => {
                    options.holdout = value()?
                        .parse::<usize>()
                        .map_err(|_| "holdout must be a non-negative integer".to_string())?
                }
                "--seed" => {
                    options.seed = value()?
                        .parse::<u64>()
                        .map_err(|_| "seed must be a non-negative integer".to_string())?
                }
                "--max-iters" => options.max_iters = parse_count("--max-iters", &value()?)?,
                _ => return Err(format!("unrecognized argument '{arg}'")),
            }
        }

        if options.holdout >= options.seasons {
            return Err(format!(
                "holdout ({}) must leave at least one training season out of {}",
                options.holdout, options.seasons
            ));
        }
        Ok(options)
    }

    fn print_help() {
        println!(
            "\
Usage: cargo run --bin hmm_probe [-- <options>]

Options:
  --format <csv|table|json>     Output format (default: csv)
  --seasons <N>                 Number of synthetic seasons (default: 6)
  --teams <N>                   Teams per season (default: 30)
  --games <N>                   Games per team-season (default: 82)
  --bins <N>                    Observation symbols, at least 2 (default: 5)
  --holdout <N>                 Most recent seasons held out for testing (default: 1)
  --seed <N>                    Seed for data generation and Baum-Welch init (default: 2024)
  --max-iters <N>               Baum-Welch iteration budget (default: 100)
  -h, --help                    Print this help message

Logging is controlled through RUST_LOG, e.g. RUST_LOG=outcome_hmm=debug.

Examples:
  cargo run --bin hmm_probe
  cargo run --bin hmm_probe -- --format table --bins 3 --holdout 2
"
        );
    }
}

fn parse_count(flag: &str, value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{flag} must be a positive integer")),
    }
}

#[derive(Copy, Clone)]
enum OutputFormat {
    Csv,
    Table,
    Json,
}

impl OutputFormat {
    fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "csv" => Ok(Self::Csv),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'")),
        }
    }

    fn write(self, measurements: &[Measurement]) -> Result<(), String> {
        match self {
            OutputFormat::Csv => write_csv(measurements),
            OutputFormat::Table => write_table(measurements),
            OutputFormat::Json => write_json(measurements),
        }
    }
}

struct Measurement {
    scenario: &'static str,
    size_desc: String,
    wall_s: f64,
    rss_delta_kib: u64,
    outcome: Outcome,
}

enum Outcome {
    Scored { accuracy: f64, detail: Option<String> },
    Failed(String),
}

impl Outcome {
    fn label(&self) -> &'static str {
        match self {
            Outcome::Scored { .. } => "ok",
            Outcome::Failed(_) => "failed",
        }
    }

    fn accuracy(&self) -> Option<f64> {
        match self {
            Outcome::Scored { accuracy, .. } => Some(*accuracy),
            Outcome::Failed(_) => None,
        }
    }

    fn detail(&self) -> Option<&str> {
        match self {
            Outcome::Scored { detail, .. } => detail.as_deref(),
            Outcome::Failed(msg) => Some(msg),
        }
    }
}

fn run_oracle(truth: &HmmParams, split: &HoldoutSplit, size_desc: &str, sys: &mut System) -> Measurement {
    let m = measure("oracle_decode", size_desc, sys, || {
        let paths = decode_batch(truth, &split.test.observations)?;
        let accuracy = sequence_accuracy(split.test.states.as_slice(), &paths);
        Ok((accuracy, None))
    });
    report(&m);
    m
}

fn run_supervised(options: &Options, split: &HoldoutSplit, size_desc: &str, sys: &mut System) -> Measurement {
    let m = measure("supervised", size_desc, sys, || {
        let hmm = SupervisedEstimator::new(2)
            .with_n_symbols(options.bins)
            .fit(&split.train)?;
        let paths = decode_batch(&hmm, &split.test.observations)?;
        let accuracy = sequence_accuracy(split.test.states.as_slice(), &paths);
        Ok((accuracy, None))
    });
    report(&m);
    m
}

fn run_baum_welch(options: &Options, split: &HoldoutSplit, size_desc: &str, sys: &mut System) -> Measurement {
    let m = measure("baum_welch_mapped", size_desc, sys, || {
        let fit = BaumWelch::builder(2)
            .with_n_symbols(options.bins)
            .with_max_iters(options.max_iters)
            .with_seed(options.seed)
            .build()?
            .fit(&split.train.observations)?;
        let train_hidden = decode_batch(&fit.params, &split.train.observations)?;
        let map = StateLabelMap::fit(&train_hidden, split.train.states.as_slice(), 2, None)?;
        let test_hidden = decode_batch(&fit.params, &split.test.observations)?;
        let mapped = map.apply_all(&test_hidden)?;
        let accuracy = sequence_accuracy(split.test.states.as_slice(), &mapped);
        let detail = format!(
            "iterations={} converged={} final_ll={:.3}",
            fit.iterations,
            fit.converged,
            fit.log_likelihoods.last().copied().unwrap_or(f64::NAN)
        );
        Ok((accuracy, Some(detail)))
    });
    report(&m);
    m
}

fn report(m: &Measurement) {
    match &m.outcome {
        Outcome::Scored { accuracy, detail } => eprintln!(
            "      ✓ accuracy={:.4}, time={:.3}s{}",
            accuracy,
            m.wall_s,
            detail.as_ref().map(|d| format!(", {d}")).unwrap_or_default()
        ),
        Outcome::Failed(msg) => eprintln!("      ✗ {msg}"),
    }
}

fn print_summary(measurements: &[Measurement]) {
    eprintln!("\n{}", "=".repeat(80));
    eprintln!("Summary");
    eprintln!("{}", "=".repeat(80));
    let failed = measurements
        .iter()
        .filter(|m| matches!(m.outcome, Outcome::Failed(_)))
        .count();
    let oracle = measurements
        .iter()
        .find(|m| m.scenario == "oracle_decode")
        .and_then(|m| m.outcome.accuracy());
    for m in measurements {
        match (m.outcome.accuracy(), oracle) {
            (Some(acc), Some(best)) if m.scenario != "oracle_decode" => eprintln!(
                "  {:<20} accuracy={:.4} ({:+.4} vs generating model)",
                m.scenario,
                acc,
                acc - best
            ),
            (Some(acc), _) => eprintln!("  {:<20} accuracy={:.4}", m.scenario, acc),
            (None, _) => eprintln!("  {:<20} failed", m.scenario),
        }
    }
    eprintln!();
    if failed == 0 {
        eprintln!("✓ All scenarios completed.");
    } else {
        eprintln!("✗ {failed} scenario(s) failed. Please review the errors above.");
    }
    eprintln!("{}", "=".repeat(80));
    eprintln!();
}

fn measure<F>(scenario: &'static str, size_desc: &str, sys: &mut System, compute: F) -> Measurement
where
    F: FnOnce() -> outcome_hmm::Result<(f64, Option<String>)>,
{
    let before = rss_kib(sys);
    let start = Instant::now();
    let result = compute();
    let duration = start.elapsed();
    let after = rss_kib(sys);
    Measurement {
        scenario,
        size_desc: size_desc.to_string(),
        wall_s: duration.as_secs_f64(),
        rss_delta_kib: after.saturating_sub(before),
        outcome: match result {
            Ok((accuracy, detail)) => Outcome::Scored { accuracy, detail },
            Err(err) => Outcome::Failed(err.to_string()),
        },
    }
}

fn write_csv(measurements: &[Measurement]) -> Result<(), String> {
    println!("scenario,size_desc,wall_s,rss_delta_kib,status,accuracy,detail");
    for m in measurements {
        let detail = m.outcome.detail().map(|s| s.replace('"', "'")).unwrap_or_default();
        println!(
            "{},\"{}\",{:.3},{},{},{},\"{}\"",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.outcome.label(),
            m.outcome.accuracy().map(|a| format!("{a:.4}")).unwrap_or_default(),
            detail
        );
    }
    Ok(())
}

fn write_table(measurements: &[Measurement]) -> Result<(), String> {
    let mut col1 = "scenario".len();
    let mut col2 = "size".len();
    for m in measurements {
        col1 = col1.max(m.scenario.len());
        col2 = col2.max(m.size_desc.len());
    }
    println!(
        "{:<col1$}  {:<col2$}  {:>10}  {:>14}  {:>8}  {:>10}  {}",
        "scenario", "size", "wall_s", "rss_delta_kib", "status", "accuracy", "detail",
    );
    println!(
        "{:-<col1$}  {:-<col2$}  {:-<10}  {:-<14}  {:-<8}  {:-<10}  {:-<12}",
        "", "", "", "", "", "", "",
    );
    for m in measurements {
        println!(
            "{:<col1$}  {:<col2$}  {:>10.3}  {:>14}  {:>8}  {:>10}  {}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.outcome.label(),
            m.outcome.accuracy().map(|a| format!("{a:.4}")).unwrap_or_default(),
            m.outcome.detail().unwrap_or(""),
        );
    }
    Ok(())
}

fn write_json(measurements: &[Measurement]) -> Result<(), String> {
    println!("[");
    for (idx, m) in measurements.iter().enumerate() {
        let detail = m.outcome.detail().map(|s| s.replace('"', "'"));
        println!(
            "  {{\"scenario\":\"{}\",\"size\":\"{}\",\"wall_s\":{:.3},\"rss_delta_kib\":{},\"status\":\"{}\",\"accuracy\":{},\"detail\":{}}}{}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.outcome.label(),
            m.outcome
                .accuracy()
                .map(|a| format!("{a:.6}"))
                .unwrap_or_else(|| "null".to_string()),
            match detail {
                Some(ref d) => format!("\"{d}\""),
                None => "null".to_string(),
            },
            if idx + 1 == measurements.len() { "" } else { "," }
        );
    }
    println!("]");
    Ok(())
}

fn rss_kib(sys: &mut System) -> u64 {
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    if let Some(process) = get_current_pid().ok().and_then(|pid| sys.process(pid)) {
        process.memory()
    } else {
        0
    }
}

/// Two-state outcome model: losses lean towards low performance bins, wins
/// towards high ones, and results are mildly streaky.
fn ground_truth(bins: usize) -> outcome_hmm::Result<HmmParams> {
    if bins < 2 {
        return Err(outcome_hmm::HmmError::InvalidConfig(format!(
            "need at least 2 bins, got {bins}"
        )));
    }
    let ramp = |weight: &dyn Fn(usize) -> f64| {
        let raw: Vec<f64> = (0..bins).map(weight).collect();
        let total: f64 = raw.iter().sum();
        raw.into_iter().map(|w| w / total).collect::<Vec<_>>()
    };
    let loss = ramp(&|k| (bins - k) as f64);
    let win = ramp(&|k| (k + 1) as f64);
    HmmParams::from_rows(
        vec![0.5, 0.5],
        &[vec![0.6, 0.4], vec![0.4, 0.6]],
        &[loss, win],
    )
}

fn synthetic_corpus(truth: &HmmParams, options: &Options) -> SeasonCorpus {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut corpus = SeasonCorpus::new();
    for offset in 0..options.seasons {
        let season = 2000 + offset as i32;
        for team in 0..options.teams {
            let (states, observations) = truth.sample(options.games, &mut rng);
            corpus.insert(
                season,
                TeamSeason {
                    team: format!("team_{team:02}"),
                    states,
                    observations,
                },
            );
        }
    }
    corpus
}
