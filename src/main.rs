// Command-line host for the color classifier

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colornet::{AppConfig, Dataset, HostCommand, TrainConfig, Trainer, worker};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Training split as `label,r,g,b` CSV
    #[arg(long, value_name = "CSV", requires = "test")]
    train: Option<PathBuf>,

    /// Test split as `label,r,g,b` CSV
    #[arg(long, value_name = "CSV", requires = "train")]
    test: Option<PathBuf>,

    /// Samples per split for the synthetic dataset (when no CSV is given)
    #[arg(long, value_name = "N")]
    synthetic: Option<usize>,

    /// Seed for data generation, initialization and batch sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Number of training iterations
    #[arg(long, value_name = "N")]
    iters: Option<usize>,

    /// Write progress messages as JSON lines to PATH (`-` for stdout)
    #[arg(long, value_name = "PATH|-")]
    events: Option<String>,

    /// Read host commands as JSON lines from stdin instead of running once
    #[arg(long)]
    listen: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .target(env_logger::Target::Stderr)
    .init();

    if let Err(e) = run(args) {
        log::error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut cfg = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(train) = &args.train {
        cfg.data.train = Some(train.clone());
    }
    if let Some(test) = &args.test {
        cfg.data.test = Some(test.clone());
    }
    if let Some(n) = args.synthetic {
        cfg.data.synthetic = n;
    }
    if let Some(seed) = args.seed {
        cfg.train.seed = Some(seed);
    }
    if let Some(iters) = args.iters {
        cfg.train.iters_num = iters;
    }

    cfg.train.validate()?;
    Ok(cfg)
}

fn open_events(target: Option<&str>) -> Result<Option<Box<dyn Write + Send>>> {
    match target {
        None => Ok(None),
        Some("-") => Ok(Some(Box::new(io::stdout()))),
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("failed to create {path}"))?;
            Ok(Some(Box::new(BufWriter::new(file))))
        }
    }
}

/// Reject a run the worker could only fail silently.
///
/// The worker keeps one config for its whole life, so every `train:start` would hit the
/// same error.
fn check_runnable(train: &Dataset, test: &Dataset, config: &TrainConfig) -> Result<()> {
    Trainer::new(train, test, config.clone()).context("cannot start training")?;
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let cfg = load_config(&args)?;
    let (train, test) = cfg.data.load_splits(cfg.train.seed)?;
    check_runnable(&train, &test, &cfg.train)?;
    let mut out = open_events(args.events.as_deref())?;

    let handle = worker::spawn(train, test, cfg.train);
    let events = handle.events().clone();

    let writer = std::thread::spawn(move || -> Result<()> {
        for msg in events.iter() {
            if let Some(out) = out.as_mut() {
                writeln!(out, "{}", msg.to_json_string()?)?;
            }
        }
        if let Some(out) = out.as_mut() {
            out.flush()?;
        }
        Ok(())
    });

    if args.listen {
        for line in io::stdin().lock().lines() {
            let line = line.context("failed to read stdin")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match HostCommand::from_json_str(line) {
                Ok(cmd) => {
                    if !handle.send(cmd) {
                        bail!("worker stopped accepting commands");
                    }
                }
                Err(e) => log::warn!("ignoring command: {e}"),
            }
        }
    } else if !handle.start() {
        bail!("worker stopped accepting commands");
    }

    if handle.shutdown().is_err() {
        bail!("worker thread panicked");
    }
    match writer.join() {
        Ok(result) => result,
        Err(_) => bail!("event writer panicked"),
    }
}
