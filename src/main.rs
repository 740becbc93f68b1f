//! Headless runner: steps a tank and logs population reports.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use protozoa::simulation::params::Params;
use protozoa::simulation::tank::Tank;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "protozoa")]
#[command(about = "Headless protozoa tank simulation")]
struct Cli {
    /// Path to a parameter file (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resume from a saved tank instead of creating a new one
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(long, default_value_t = 2000)]
    ticks: u64,

    /// Override the seed from the parameter file
    #[arg(long)]
    seed: Option<u64>,

    /// Log a population report every this many ticks
    #[arg(long, default_value_t = 100)]
    report_every: u64,

    /// Save the final tank to this file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Write the effective parameters to stdout and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => Params::load_from_file(path)
            .with_context(|| format!("failed to load parameters from {}", path.display()))?,
        None => Params::default(),
    };
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }
    if cli.dump_config {
        println!("{}", serde_json::to_string_pretty(&params)?);
        return Ok(());
    }

    let mut tank = match &cli.resume {
        Some(path) => {
            let ignored = ignored_when_resuming(&cli);
            if !ignored.is_empty() {
                warn!(?ignored, "the saved tank keeps its own parameters; flags ignored");
            }
            Tank::load_from_file(path)
                .with_context(|| format!("failed to load tank from {}", path.display()))?
        }
        None => Tank::new(params).context("invalid parameters")?,
    };

    info!(ticks = cli.ticks, "starting simulation");
    for _ in 0..cli.ticks {
        tank.step();
        if cli.report_every > 0 && tank.tick() % cli.report_every == 0 {
            report(&tank);
        }
    }
    report(&tank);

    if let Some(path) = &cli.save {
        tank.save_to_file(path)
            .with_context(|| format!("failed to save tank to {}", path.display()))?;
        info!(path = %path.display(), "tank saved");
    }
    Ok(())
}

/// Flags that have no effect when a saved tank is resumed.
fn ignored_when_resuming(cli: &Cli) -> Vec<&'static str> {
    let mut ignored = Vec::new();
    if cli.config.is_some() {
        ignored.push("--config");
    }
    if cli.seed.is_some() {
        ignored.push("--seed");
    }
    ignored
}

fn report(tank: &Tank) {
    let census = tank.census();
    let stats = tank.reproduction_stats();
    info!(
        tick = tank.tick(),
        time = tank.time(),
        protozoa = census.protozoa,
        plants = census.plants,
        meat = census.meat,
        splits = stats.splits,
        matings = stats.matings,
        miscarriages = stats.miscarriages,
        avg_litter = stats.avg_litter_size(),
        "population report"
    );
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resume_reports_overridden_flags() {
        let cli = Cli::parse_from(["protozoa", "--resume", "tank.json", "--seed", "3", "--config", "p.json"]);
        assert_eq!(ignored_when_resuming(&cli), vec!["--config", "--seed"]);

        let cli = Cli::parse_from(["protozoa", "--resume", "tank.json"]);
        assert!(ignored_when_resuming(&cli).is_empty());
    }
}
