//! Per-step market orchestration.
//!
//! One [`MarketSimulator::execute_step`] call is one discrete time step:
//! generated trades hit the real pools, freshly implied prices are marked
//! on the tokens, the arbitrage strategy closes any peg gap, and the
//! virtual pool runs one replenishing round. The step either completes
//! fully or aborts; there is no partial retry inside the core.

use arbitrage_strategy::{
    ArbitrageExecution, ArbitrageOptimizer, SharedLiquidityPool, SharedVirtualLiquidityPool,
};
use pegsim_amm::AmmError;
use tracing::{debug, warn};

use crate::error::SimulationError;
use crate::generators::PurchaseGenerator;

/// What a single step produced, for telemetry.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    pub arbitrage: Option<ArbitrageExecution>,
}

/// Drives the three-pool economy: two real pools with their purchase
/// generators, the virtual pool, and the arbitrage optimizer.
pub struct MarketSimulator {
    stablecoin_pool: SharedLiquidityPool,
    collateral_pool: SharedLiquidityPool,
    virtual_pool: SharedVirtualLiquidityPool,
    stablecoin_purchase_generator: Box<dyn PurchaseGenerator>,
    collateral_purchase_generator: Box<dyn PurchaseGenerator>,
    arbitrage_optimizer: Box<dyn ArbitrageOptimizer>,
    collapse_floor: f64,
}

impl MarketSimulator {
    pub fn new(
        stablecoin_pool: SharedLiquidityPool,
        collateral_pool: SharedLiquidityPool,
        virtual_pool: SharedVirtualLiquidityPool,
        stablecoin_purchase_generator: Box<dyn PurchaseGenerator>,
        collateral_purchase_generator: Box<dyn PurchaseGenerator>,
        arbitrage_optimizer: Box<dyn ArbitrageOptimizer>,
        collapse_floor: f64,
    ) -> Result<Self, SimulationError> {
        if collapse_floor < 0.0 {
            return Err(SimulationError::InvalidParameter {
                name: "collapse_floor",
                value: collapse_floor,
            });
        }
        if !stablecoin_purchase_generator
            .token()
            .same_token(stablecoin_pool.read().token_a())
        {
            return Err(SimulationError::MismatchedCollaborators(
                "stablecoin purchase generator does not trade the stablecoin pool's token",
            ));
        }
        if !collateral_purchase_generator
            .token()
            .same_token(collateral_pool.read().token_a())
        {
            return Err(SimulationError::MismatchedCollaborators(
                "collateral purchase generator does not trade the collateral pool's token",
            ));
        }
        Ok(Self {
            stablecoin_pool,
            collateral_pool,
            virtual_pool,
            stablecoin_purchase_generator,
            collateral_purchase_generator,
            arbitrage_optimizer,
            collapse_floor,
        })
    }

    /// Runs one full step: purchases → mark → arbitrage → replenishing.
    ///
    /// Solver non-convergence only skips arbitrage for the step; any other
    /// failure aborts it. A collateral price at or below the collapse
    /// floor ends the run with [`SimulationError::StablecoinCollapse`].
    pub fn execute_step(&mut self) -> Result<StepOutcome, SimulationError> {
        self.execute_random_purchases()?;
        self.mark_prices()?;

        let arbitrage = match self.arbitrage_optimizer.leverage_arbitrage_opportunity() {
            Ok(execution) => execution,
            Err(error) if error.is_optimization_failure() => {
                warn!(%error, "skipping arbitrage for this step");
                None
            }
            Err(error) => return Err(error.into()),
        };

        // Arbitrage moved reserves; re-mark before feeding the virtual
        // pool its price observations.
        let (stablecoin_price, collateral_price) = self.mark_prices()?;

        if collateral_price <= self.collapse_floor {
            return Err(SimulationError::StablecoinCollapse {
                collateral_price,
                floor: self.collapse_floor,
            });
        }

        {
            let mut virtual_pool = self.virtual_pool.write();
            virtual_pool.update_collateral_price(collateral_price)?;
            virtual_pool.update_stablecoin_price(stablecoin_price)?;
            virtual_pool.perform_pool_replenishing()?;
        }

        Ok(StepOutcome { arbitrage })
    }

    /// Lets each generator trade against its pool. Trades the token
    /// bookkeeping cannot honor (balance exhausted, payout beyond the
    /// reserve) are skipped; the step goes on.
    fn execute_random_purchases(&mut self) -> Result<(), SimulationError> {
        for (pool, generator) in [
            (
                &self.stablecoin_pool,
                &mut self.stablecoin_purchase_generator,
            ),
            (
                &self.collateral_pool,
                &mut self.collateral_purchase_generator,
            ),
        ] {
            let amount = generator.next_trade()?;
            if amount == 0.0 {
                continue;
            }
            let token = generator.token().clone();
            let result = pool.write().swap(&token, amount);
            match result {
                Ok((_, other_amount)) => {
                    debug!(token = %token.name(), amount, other_amount, "executed generated trade");
                }
                Err(error @ (AmmError::Token(_) | AmmError::OutputExceedsReserve { .. })) => {
                    warn!(%error, token = %token.name(), amount, "skipping infeasible generated trade");
                }
                Err(error) => return Err(error.into()),
            }
        }
        Ok(())
    }

    /// Re-derives both reference prices from the pools and writes them to
    /// the tokens. The reference token prices at 1, so a token's price is
    /// simply the reserve ratio.
    fn mark_prices(&self) -> Result<(f64, f64), SimulationError> {
        let (stablecoin, stablecoin_price) = {
            let pool = self.stablecoin_pool.read();
            (pool.token_a().clone(), pool.implied_price_token_a())
        };
        let (collateral, collateral_price) = {
            let pool = self.collateral_pool.read();
            (pool.token_a().clone(), pool.implied_price_token_a())
        };
        stablecoin.set_price(stablecoin_price)?;
        collateral.set_price(collateral_price)?;
        Ok((stablecoin_price, collateral_price))
    }
}
