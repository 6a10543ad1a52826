//! Command-line entry point for the wrestling Elo pipeline
//!
//! Classifies result lines, replays ratings from a JSON-lines contest file
//! and validates configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use wrestling_elo::classifier::classify_traced;
use wrestling_elo::config::AppConfig;
use wrestling_elo::metrics::MetricsCollector;
use wrestling_elo::rating::{InMemoryRepository, RatingEngine};
use wrestling_elo::service::{ContestIngestor, ReplayService};
use wrestling_elo::types::RawContest;

/// Wrestling Elo - classify result lines and replay ratings
#[derive(Parser)]
#[command(
    name = "wrestling-elo",
    version,
    about = "Classifies wrestling result lines and folds them into Elo ratings"
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one result line per input line and print JSON outcomes
    Classify {
        /// Input file (stdin when omitted)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Ingest JSON-lines contests and replay ratings
    Rate {
        /// JSON-lines file of raw contests
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        /// Leaderboard rows to print
        #[arg(short, long, default_value = "25")]
        top: usize,
        /// Write the rating history as JSON lines to this file
        #[arg(long, value_name = "FILE")]
        history: Option<PathBuf>,
        /// Print metrics in the Prometheus text format afterwards
        #[arg(long)]
        metrics: bool,
    },
    /// Validate and print the effective configuration
    CheckConfig,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    wrestling_elo::config::validate_config(&config)?;
    Ok(config)
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn run_classify(input: Option<&Path>) -> Result<()> {
    let reader = open_input(input)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut unparsed = 0usize;
    let mut total = 0usize;

    for line in reader.lines() {
        let line = line.context("Failed to read input line")?;
        if line.trim().is_empty() {
            continue;
        }
        total += 1;
        let classification = classify_traced(&line);
        if !classification.is_recognised() {
            warn!("Unparsed contest line: '{}'", line);
            unparsed += 1;
        }
        serde_json::to_writer(&mut out, &classification.outcome)?;
        writeln!(out)?;
    }
    out.flush()?;

    info!("Classified {} lines ({} unparsed)", total, unparsed);
    Ok(())
}

fn read_contests(path: &Path) -> Result<Vec<RawContest>> {
    let reader = open_input(Some(path))?;
    let mut contests = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input line")?;
        if line.trim().is_empty() {
            continue;
        }
        let contest: RawContest = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid contest record", path.display(), idx + 1))?;
        contests.push(contest);
    }
    Ok(contests)
}

fn run_rate(
    config: &AppConfig,
    input: &Path,
    top: usize,
    history: Option<&Path>,
    print_metrics: bool,
) -> Result<()> {
    let contests = read_contests(input)?;
    info!("Loaded {} contests from {}", contests.len(), input.display());

    let repository = Arc::new(InMemoryRepository::new());
    let metrics = Arc::new(MetricsCollector::new()?);
    let engine = RatingEngine::new(config.rating.clone())?;

    let ingestor = ContestIngestor::new(repository.clone(), metrics.clone());
    ingestor.ingest(contests)?;

    let replay = ReplayService::new(repository.clone(), engine, metrics.clone());
    let report = replay.replay()?;

    println!(
        "{:>4}  {:<32} {:>8} {:>9} {:>7}  {}",
        "Rank", "Wrestler", "Rating", "W-L", "Matches", "Team"
    );
    for (rank, state) in report.book.leaderboard().into_iter().take(top).enumerate() {
        println!(
            "{:>4}  {:<32} {:>8.1} {:>9} {:>7}  {}",
            rank + 1,
            state.name,
            state.rating,
            format!("{}-{}", state.wins, state.losses),
            state.matches_played,
            state.last_team.as_deref().unwrap_or("")
        );
    }

    if let Some(path) = history {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        for entry in repository.history()? {
            serde_json::to_writer(&mut out, &entry)?;
            writeln!(out)?;
        }
        out.flush()?;
        info!("Wrote {} history rows to {}", report.history_entries, path.display());
    }

    if print_metrics {
        print!("{}", metrics.gather_text()?);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let result = match &args.command {
        Commands::Classify { input } => run_classify(input.as_deref()),
        Commands::Rate {
            input,
            top,
            history,
            metrics,
        } => run_rate(&config, input, *top, history.as_deref(), *metrics),
        Commands::CheckConfig => {
            info!("Configuration validation successful");
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("{} failed: {:#}", config.service.name, e);
    }
    result
}
