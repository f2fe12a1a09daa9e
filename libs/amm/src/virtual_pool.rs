//! Virtual liquidity pool: the synthetic stablecoin/collateral market
//! used to defend the peg.
//!
//! Unlike a real pool, the virtual pool has no funded reserves. Its
//! stablecoin side is a reference level (`stablecoin_base_quantity`) plus
//! `delta`, the accumulated net stablecoin absorbed since the last full
//! recovery; its collateral side follows from the last observed collateral
//! price. Delta is the single source of truth: both reserves are derived
//! views, rebuilt before every swap and on every replenishing step, never
//! trusted as stored state. Swaps settle by minting and burning the two
//! seignorage tokens rather than by moving circulating supply.

use std::fmt;
use std::sync::Arc;

use pegsim_types::Token;

use crate::error::AmmError;
use crate::formula::SwapFormula;
use crate::pool::{LiquidityPool, SupplyLedger};
use crate::recovery::RecoveryPolicy;

pub struct VirtualLiquidityPool {
    pool: LiquidityPool,
    stablecoin_base_quantity: f64,
    collateral_price: f64,
    stablecoin_price: f64,
    delta: f64,
    recovery: Box<dyn RecoveryPolicy>,
}

impl VirtualLiquidityPool {
    /// Builds the virtual pool around a stablecoin/collateral pair. The
    /// collateral reserve is seeded from the collateral's current price so
    /// the implied stablecoin price starts at the collateral-backed value.
    pub fn new(
        stablecoin: Token,
        collateral: Token,
        stablecoin_base_quantity: f64,
        fee: f64,
        formula: Arc<dyn SwapFormula>,
        recovery: Box<dyn RecoveryPolicy>,
    ) -> Result<Self, AmmError> {
        if stablecoin_base_quantity <= 0.0 {
            return Err(AmmError::NonPositiveQuantity {
                name: "stablecoin base quantity",
                value: stablecoin_base_quantity,
            });
        }
        let collateral_price = collateral.price();
        let stablecoin_price = stablecoin.price();
        let quantity_collateral = stablecoin_base_quantity / collateral_price;
        let pool = LiquidityPool::new(
            stablecoin,
            collateral,
            stablecoin_base_quantity,
            quantity_collateral,
            fee,
            formula,
        )?;
        Ok(Self {
            pool,
            stablecoin_base_quantity,
            collateral_price,
            stablecoin_price,
            delta: 0.0,
            recovery,
        })
    }

    pub fn stablecoin(&self) -> &Token {
        self.pool.token_a()
    }

    pub fn collateral(&self) -> &Token {
        self.pool.token_b()
    }

    pub fn stablecoin_base_quantity(&self) -> f64 {
        self.stablecoin_base_quantity
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn quantity_token_a(&self) -> f64 {
        self.pool.quantity_token_a()
    }

    pub fn quantity_token_b(&self) -> f64 {
        self.pool.quantity_token_b()
    }

    pub fn fee(&self) -> f64 {
        self.pool.fee()
    }

    /// Records a fresh external observation of the collateral's reference
    /// price; the next reserve refresh prices the collateral side with it.
    pub fn update_collateral_price(&mut self, new_price: f64) -> Result<(), AmmError> {
        if new_price <= 0.0 {
            return Err(AmmError::NonPositiveQuantity {
                name: "collateral price",
                value: new_price,
            });
        }
        self.collateral_price = new_price;
        Ok(())
    }

    /// Records a fresh external observation of the stablecoin's reference
    /// price, consumed by the recovery policy.
    pub fn update_stablecoin_price(&mut self, new_price: f64) -> Result<(), AmmError> {
        if new_price <= 0.0 {
            return Err(AmmError::NonPositiveQuantity {
                name: "stablecoin price",
                value: new_price,
            });
        }
        self.stablecoin_price = new_price;
        Ok(())
    }

    /// Swaps against the virtual pool.
    ///
    /// Reserves are rebuilt from `(base + delta, base / collateral_price)`
    /// before delegating to the underlying swap, and delta is updated with
    /// the net stablecoin-equivalent flow afterwards: the full `amount`
    /// when the stablecoin side was deposited, minus the paid-out amount
    /// when the collateral side was.
    pub fn swap(&mut self, token: &Token, amount: f64) -> Result<(Token, f64), AmmError> {
        self.refresh_reserves();
        let stablecoin_is_input = token.same_token(self.pool.token_a());
        let (other_token, other_amount) =
            self.pool
                .swap_with_ledger(token, amount, SupplyLedger::MintBurn)?;

        let delta_variation = if stablecoin_is_input {
            amount
        } else {
            -other_amount
        };
        self.delta = self.recovery.update_delta(self.delta, delta_variation);

        Ok((other_token, other_amount))
    }

    /// Read-only quote against the current derived reserves.
    pub fn compute_swap_value(
        &self,
        input_quantity: f64,
        input_reserve: f64,
        output_reserve: f64,
    ) -> Result<f64, AmmError> {
        self.pool
            .compute_swap_value(input_quantity, input_reserve, output_reserve)
    }

    /// Periodic maintenance: relax delta through the recovery policy, then
    /// recompute the collateral reserve so the implied price stays
    /// consistent with the invariant at the new delta.
    pub fn perform_pool_replenishing(&mut self) -> Result<(), AmmError> {
        let before = self.delta;
        self.delta = self
            .recovery
            .restore_delta(self.delta, self.stablecoin_price)?;
        tracing::debug!(
            delta_before = before,
            delta_after = self.delta,
            "virtual pool replenishing step"
        );
        self.update_token_quantities()
    }

    /// Drops all accumulated imbalance: delta to zero and the recovery
    /// policy's bookkeeping to its deterministic zero state.
    pub fn reset_replenishing_system(&mut self) {
        self.delta = 0.0;
        self.recovery.reset();
    }

    fn refresh_reserves(&mut self) {
        self.pool.set_reserves(
            self.stablecoin_base_quantity + self.delta,
            self.stablecoin_base_quantity / self.collateral_price,
        );
    }

    fn update_token_quantities(&mut self) -> Result<(), AmmError> {
        let new_quantity_token_a = self.stablecoin_base_quantity + self.delta;
        let new_quantity_token_b = self.pool.formula().compute_reserve(
            self.pool.quantity_token_a(),
            self.pool.quantity_token_b(),
            new_quantity_token_a,
        )?;
        self.pool
            .set_reserves(new_quantity_token_a, new_quantity_token_b);
        Ok(())
    }
}

impl fmt::Debug for VirtualLiquidityPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualLiquidityPool")
            .field("stablecoin", &self.pool.token_a().name())
            .field("collateral", &self.pool.token_b().name())
            .field("stablecoin_base_quantity", &self.stablecoin_base_quantity)
            .field("delta", &self.delta)
            .field("collateral_price", &self.collateral_price)
            .finish()
    }
}
