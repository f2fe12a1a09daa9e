use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use market_simulator::{SimulationConfig, ThreePoolsSimulation};

/// Discrete-step simulation of an algorithmic-stablecoin AMM economy.
#[derive(Parser, Debug)]
#[command(name = "market_simulator", version, about)]
struct Args {
    /// Path to a JSON configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of simulation steps.
    #[arg(long)]
    iterations: Option<usize>,

    /// Override the RNG seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Write per-step telemetry to this JSON file.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    config.apply_env_overrides();
    if let Some(iterations) = args.iterations {
        config.run.iterations = iterations;
    }
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    config.validate().context("invalid configuration")?;

    info!(
        iterations = config.run.iterations,
        seed = config.run.seed,
        recovery_policy = ?config.virtual_pool.recovery_policy,
        "starting simulation"
    );

    let mut simulation =
        ThreePoolsSimulation::from_config(&config).context("failed to wire the simulation")?;
    let result = simulation.run().context("simulation run failed")?;

    let history = &result.history;
    info!(
        outcome = ?result.outcome,
        steps = history.len(),
        executed_arbitrages = history.executed_arbitrages,
        final_stablecoin_price = history.stablecoin_price.last().copied().unwrap_or(f64::NAN),
        final_collateral_price = history.collateral_price.last().copied().unwrap_or(f64::NAN),
        final_delta = history.virtual_pool_delta.last().copied().unwrap_or(f64::NAN),
        "simulation finished"
    );

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write telemetry to {}", path.display()))?;
        info!(path = %path.display(), "telemetry written");
    }

    Ok(())
}
