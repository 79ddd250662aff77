//! Batch training CLI.
//!
//! Reads a CSV dataset, fits a gradient-boosted classifier, and writes the
//! model artifact.
//!
//! Usage:
//!   train --data data/train.csv --out models/model.gbcm [options]
//!
//! Options:
//!   --trees N            Number of boosting rounds (default: 100)
//!   --depth N            Maximum tree depth (default: 3)
//!   --learning-rate F    Shrinkage in (0, 1] (default: 0.1)
//!   --min-leaf N         Minimum rows per splittable node (default: 1)
//!   --seed N             Random seed recorded in the artifact (default: 42)
//!   --threads N          0 = auto, 1 = sequential, n = exact (default: 0)

use std::error::Error as _;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;

use treeboost::{pipeline, TrainConfig};

const USAGE: &str = "usage: train --data <csv> --out <artifact> \
[--trees N] [--depth N] [--learning-rate F] [--min-leaf N] [--seed N] [--threads N]";

#[derive(Debug)]
struct Args {
    data: PathBuf,
    out: PathBuf,
    config: TrainConfig,
    threads: usize,
}

fn next_value(argv: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    argv.next().ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_value<T: FromStr>(value: &str, flag: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{flag}: cannot parse {value:?}"))
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut data = None;
    let mut out = None;
    let mut config = TrainConfig::default();
    let mut threads = 0usize;

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--data" => data = Some(PathBuf::from(next_value(&mut argv, "--data")?)),
            "--out" => out = Some(PathBuf::from(next_value(&mut argv, "--out")?)),
            "--trees" => {
                config.n_estimators = parse_value(&next_value(&mut argv, "--trees")?, "--trees")?
            }
            "--depth" => {
                config.max_depth = parse_value(&next_value(&mut argv, "--depth")?, "--depth")?
            }
            "--learning-rate" => {
                config.learning_rate =
                    parse_value(&next_value(&mut argv, "--learning-rate")?, "--learning-rate")?
            }
            "--min-leaf" => {
                config.min_leaf = parse_value(&next_value(&mut argv, "--min-leaf")?, "--min-leaf")?
            }
            "--seed" => config.seed = parse_value(&next_value(&mut argv, "--seed")?, "--seed")?,
            "--threads" => {
                threads = parse_value(&next_value(&mut argv, "--threads")?, "--threads")?
            }
            "--help" | "-h" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    let data = data.ok_or("--data is required")?;
    let out = out.ok_or("--out is required")?;

    Ok(Args { data, out, config, threads })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    if let Err(err) = pipeline::train(&args.data, &args.out, &args.config, args.threads) {
        eprintln!("error: {err}");
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        process::exit(1);
    }
}
