//! # Arbitrage Detection and Execution Engine
//!
//! ## Purpose
//!
//! Watches the price relationship between the two real pools and the
//! virtual pool and closes profitable gaps. A stablecoin trading above its
//! peg is pulled down by minting stablecoin against collateral through the
//! virtual pool and selling it; a stablecoin below peg is pulled up by the
//! mirror path. Trade sizing runs a bounded scalar maximization over the
//! round-trip profit curve, which AMM slippage makes unimodal.
//!
//! ## Architecture Role
//!
//! ```text
//! Pool State → [detect_arbitrage] → [compute_max_arbitrage_profit] → [execute]
//!                unit-probe quote      golden-section sizing          3 swaps
//! ```
//!
//! Detection and sizing are read-only; only `leverage_arbitrage_opportunity`
//! mutates pool state, and only after an opportunity is confirmed.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use pegsim_amm::{maximize_scalar_bounded, LiquidityPool, VirtualLiquidityPool};

use crate::config::OptimizerConfig;
use crate::error::ArbitrageError;

/// Pools are shared with the simulator; the optimizer locks them only for
/// the duration of a quote or an executed swap.
pub type SharedLiquidityPool = Arc<RwLock<LiquidityPool>>;
pub type SharedVirtualLiquidityPool = Arc<RwLock<VirtualLiquidityPool>>;

/// Probe size (in reference tokens) used to test whether a round trip is
/// profitable at all.
const PROBE_AMOUNT: f64 = 1.0;

/// Lower bound of the sizing search.
const MIN_TRADE_INPUT: f64 = 1.0;

/// The two directions of a profitable three-hop round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbitrageKind {
    /// Stablecoin trades above its peg: buy collateral with reference
    /// tokens, convert collateral to stablecoin in the virtual pool, sell
    /// the stablecoin for reference tokens.
    StablecoinAbovePeg,
    /// Stablecoin trades below its peg: buy stablecoin, convert it to
    /// collateral in the virtual pool, sell the collateral.
    StablecoinBelowPeg,
}

/// Record of an executed round trip, in reference-token units.
#[derive(Debug, Clone, Copy)]
pub struct ArbitrageExecution {
    pub kind: ArbitrageKind,
    pub reference_input: f64,
    pub reference_output: f64,
}

impl ArbitrageExecution {
    pub fn profit(&self) -> f64 {
        self.reference_output - self.reference_input
    }
}

/// Strategy seam for the market simulator: detect and exploit whatever
/// opportunity the current pool state offers.
pub trait ArbitrageOptimizer {
    fn leverage_arbitrage_opportunity(
        &mut self,
    ) -> Result<Option<ArbitrageExecution>, ArbitrageError>;
}

/// Arbitrage over two real pools and one virtual pool.
///
/// The stablecoin pool trades the stablecoin against the reference token,
/// the collateral pool trades the collateral against the same reference,
/// and the virtual pool trades stablecoin against collateral.
pub struct ThreePoolsArbitrageOptimizer {
    stablecoin_pool: SharedLiquidityPool,
    collateral_pool: SharedLiquidityPool,
    virtual_pool: SharedVirtualLiquidityPool,
    config: OptimizerConfig,
}

impl ThreePoolsArbitrageOptimizer {
    pub fn new(
        stablecoin_pool: SharedLiquidityPool,
        collateral_pool: SharedLiquidityPool,
        virtual_pool: SharedVirtualLiquidityPool,
        config: OptimizerConfig,
    ) -> Result<Self, ArbitrageError> {
        {
            let stablecoin = stablecoin_pool.read();
            let collateral = collateral_pool.read();
            let synthetic = virtual_pool.read();
            if !stablecoin.token_a().same_token(synthetic.stablecoin()) {
                return Err(ArbitrageError::MismatchedPools(
                    "stablecoin pool token_a is not the virtual pool's stablecoin",
                ));
            }
            if !collateral.token_a().same_token(synthetic.collateral()) {
                return Err(ArbitrageError::MismatchedPools(
                    "collateral pool token_a is not the virtual pool's collateral",
                ));
            }
            if !stablecoin.token_b().same_token(collateral.token_b()) {
                return Err(ArbitrageError::MismatchedPools(
                    "the two real pools quote against different reference tokens",
                ));
            }
        }
        Ok(Self {
            stablecoin_pool,
            collateral_pool,
            virtual_pool,
            config,
        })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Probes both round-trip directions with a unit trade. At most one
    /// direction is reported; above-peg is probed first and wins ties.
    pub fn detect_arbitrage(&self) -> Result<Option<ArbitrageKind>, ArbitrageError> {
        let above_profit =
            self.arbitrage_profit(ArbitrageKind::StablecoinAbovePeg, PROBE_AMOUNT)?;
        let below_profit =
            self.arbitrage_profit(ArbitrageKind::StablecoinBelowPeg, PROBE_AMOUNT)?;

        let (stablecoin_price, peg) = {
            let pool = self.stablecoin_pool.read();
            let token = pool.token_a();
            (token.price(), token.peg().unwrap_or(1.0))
        };

        if above_profit > 0.0 {
            if stablecoin_price < peg {
                warn!(
                    stablecoin_price,
                    peg, "above-peg arbitrage detected while the stablecoin marks below peg"
                );
            }
            Ok(Some(ArbitrageKind::StablecoinAbovePeg))
        } else if below_profit > 0.0 {
            if stablecoin_price > peg {
                warn!(
                    stablecoin_price,
                    peg, "below-peg arbitrage detected while the stablecoin marks above peg"
                );
            }
            Ok(Some(ArbitrageKind::StablecoinBelowPeg))
        } else {
            Ok(None)
        }
    }

    /// Profit (in reference tokens) of a round trip of size
    /// `reference_input`, quoted read-only against current reserves.
    /// Non-positive inputs yield zero profit.
    pub fn arbitrage_profit(
        &self,
        kind: ArbitrageKind,
        reference_input: f64,
    ) -> Result<f64, ArbitrageError> {
        if reference_input <= 0.0 {
            return Ok(0.0);
        }

        let (first_pool, second_pool) = match kind {
            ArbitrageKind::StablecoinAbovePeg => (&self.collateral_pool, &self.stablecoin_pool),
            ArbitrageKind::StablecoinBelowPeg => (&self.stablecoin_pool, &self.collateral_pool),
        };

        // Hop 1: reference in, pool-side token out.
        let intermediate = {
            let pool = first_pool.read();
            pool.compute_swap_value(
                reference_input,
                pool.quantity_token_b(),
                pool.quantity_token_a(),
            )?
        };

        // Hop 2: through the virtual pool.
        let converted = {
            let pool = self.virtual_pool.read();
            match kind {
                ArbitrageKind::StablecoinAbovePeg => pool.compute_swap_value(
                    intermediate,
                    pool.quantity_token_b(),
                    pool.quantity_token_a(),
                )?,
                ArbitrageKind::StablecoinBelowPeg => pool.compute_swap_value(
                    intermediate,
                    pool.quantity_token_a(),
                    pool.quantity_token_b(),
                )?,
            }
        };

        // Hop 3: pool-side token in, reference out.
        let reference_output = {
            let pool = second_pool.read();
            pool.compute_swap_value(
                converted,
                pool.quantity_token_a(),
                pool.quantity_token_b(),
            )?
        };

        Ok(reference_output - reference_input)
    }

    /// Input size maximizing the round-trip profit, found by bounded
    /// scalar maximization over `[1, max_arbitrage_input]`.
    pub fn compute_max_arbitrage_profit(
        &self,
        kind: ArbitrageKind,
    ) -> Result<f64, ArbitrageError> {
        let objective =
            |input: f64| self.arbitrage_profit(kind, input).unwrap_or(f64::NEG_INFINITY);
        let maximum = maximize_scalar_bounded(
            objective,
            MIN_TRADE_INPUT,
            self.config.max_arbitrage_input,
            self.config.solver_x_tolerance,
            self.config.solver_max_iterations,
        )?;
        if maximum.value < 0.0 {
            warn!(
                kind = ?kind,
                best_profit = maximum.value,
                "sizing found no profitable trade for a detected opportunity"
            );
        }
        debug!(
            kind = ?kind,
            argmax = maximum.argmax,
            profit = maximum.value,
            iterations = maximum.iterations,
            "arbitrage sizing converged"
        );
        Ok(maximum.argmax)
    }

    fn execute_round_trip(
        &mut self,
        kind: ArbitrageKind,
        reference_input: f64,
    ) -> Result<ArbitrageExecution, ArbitrageError> {
        let (first_pool, second_pool) = match kind {
            ArbitrageKind::StablecoinAbovePeg => (&self.collateral_pool, &self.stablecoin_pool),
            ArbitrageKind::StablecoinBelowPeg => (&self.stablecoin_pool, &self.collateral_pool),
        };

        let (token, intermediate) = {
            let mut pool = first_pool.write();
            let reference = pool.token_b().clone();
            pool.swap(&reference, reference_input)?
        };
        let (token, converted) = self.virtual_pool.write().swap(&token, intermediate)?;
        let (_, reference_output) = second_pool.write().swap(&token, converted)?;

        Ok(ArbitrageExecution {
            kind,
            reference_input,
            reference_output,
        })
    }
}

impl ArbitrageOptimizer for ThreePoolsArbitrageOptimizer {
    /// Detects an opportunity, sizes it, clamps the size to the configured
    /// bound, and executes the three-hop round trip.
    fn leverage_arbitrage_opportunity(
        &mut self,
    ) -> Result<Option<ArbitrageExecution>, ArbitrageError> {
        let Some(kind) = self.detect_arbitrage()? else {
            return Ok(None);
        };

        let optimal_input = self.compute_max_arbitrage_profit(kind)?;
        let trade_amount = optimal_input.min(self.config.max_arbitrage_input);
        let execution = self.execute_round_trip(kind, trade_amount)?;
        info!(
            kind = ?execution.kind,
            reference_input = execution.reference_input,
            profit = execution.profit(),
            "executed arbitrage round trip"
        );
        Ok(Some(execution))
    }
}
