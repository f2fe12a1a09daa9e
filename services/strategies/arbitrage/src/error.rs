//! Structured error types for arbitrage failures.

use pegsim_amm::{AmmError, SolverError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArbitrageError {
    /// The bounded maximization gave up before converging. Kept distinct
    /// so the orchestrator can skip arbitrage for the step rather than
    /// abort the whole run.
    #[error("arbitrage sizing failed: {0}")]
    Optimization(#[from] SolverError),

    #[error("pool wiring does not form a stablecoin/collateral/reference triangle: {0}")]
    MismatchedPools(&'static str),

    #[error(transparent)]
    Amm(#[from] AmmError),
}

impl ArbitrageError {
    /// True when the failure is solver non-convergence rather than an
    /// invalid trade or pool state.
    pub fn is_optimization_failure(&self) -> bool {
        matches!(self, ArbitrageError::Optimization(_))
    }
}
