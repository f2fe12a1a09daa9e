//! # Market Simulator - Discrete-Step Stablecoin Economy
//!
//! ## Purpose
//!
//! Orchestrates the simulated economy one discrete time step at a time:
//! stochastic purchase generators trade against the two real pools, the
//! arbitrage strategy closes any peg divergence through the virtual pool,
//! and the virtual pool's replenishing mechanism unwinds its accumulated
//! imbalance. Telemetry (prices, supplies, delta) is recorded per step for
//! downstream analysis.
//!
//! ## Integration Points
//!
//! - **Input Sources**: [`config::SimulationConfig`] (JSON file, environment
//!   overrides, CLI flags)
//! - **Output Destinations**: [`simulation::SimulationHistory`] per-step
//!   telemetry, optionally exported as JSON
//! - **Collaborators**: pools and tokens from `pegsim-amm`/`pegsim-types`,
//!   the optimizer from `arbitrage-strategy`
//! - **Sequencing**: strictly single-threaded; a step fully completes
//!   (purchases → mark → arbitrage → replenishing) before the next begins

pub mod config;
pub mod error;
pub mod generators;
pub mod market;
pub mod simulation;

pub use config::SimulationConfig;
pub use error::SimulationError;
pub use generators::{
    ExponentialWalletsGenerator, PurchaseGenerator, SeignorageRandomPurchaseGenerator,
    WalletsGenerator,
};
pub use market::{MarketSimulator, StepOutcome};
pub use simulation::{RunOutcome, SimulationHistory, SimulationRunResult, ThreePoolsSimulation};
