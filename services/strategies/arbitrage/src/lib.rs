//! # Arbitrage Strategy - Three-Pool Peg Arbitrage
//!
//! ## Purpose
//!
//! Detection and execution of arbitrage round trips across the simulated
//! market's three pools: the stablecoin/reference pool, the
//! collateral/reference pool, and the virtual stablecoin/collateral pool.
//! Detects peg divergence with a unit probe trade, sizes the
//! profit-maximizing trade with bounded scalar optimization, and executes
//! the three-hop swap chain that pulls the stablecoin back toward its peg.
//!
//! ## Integration Points
//!
//! - **Input Sources**: shared pool handles owned by the market simulator
//! - **Output Destinations**: executed swaps mutate the pools in place;
//!   an [`ArbitrageExecution`] record is returned for telemetry
//! - **Math**: read-only quoting and the bounded solver from `pegsim-amm`
//! - **Error Handling**: [`ArbitrageError`] keeps solver non-convergence
//!   distinguishable so the orchestrator can skip a step instead of
//!   aborting the run

pub mod config;
pub mod error;
pub mod optimizer;

pub use config::OptimizerConfig;
pub use error::ArbitrageError;
pub use optimizer::{
    ArbitrageExecution, ArbitrageKind, ArbitrageOptimizer, SharedLiquidityPool,
    SharedVirtualLiquidityPool, ThreePoolsArbitrageOptimizer,
};
