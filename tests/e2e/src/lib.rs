//! Shared fixtures for pegsim end-to-end tests.

use std::sync::Arc;

use parking_lot::RwLock;

use arbitrage_strategy::{SharedLiquidityPool, SharedVirtualLiquidityPool};
use pegsim_amm::{
    ConstantProductFormula, LiquidityPool, RecoveryPolicy, SimpleRecovery, SwapFormula,
    VirtualLiquidityPool,
};
use pegsim_types::Token;

/// A balanced three-pool market: stablecoin at its peg of 1, collateral
/// at 50, fee-free pools, every implied price mutually consistent.
pub struct MarketFixture {
    pub stablecoin: Token,
    pub collateral: Token,
    pub reference: Token,
    pub stablecoin_pool: SharedLiquidityPool,
    pub collateral_pool: SharedLiquidityPool,
    pub virtual_pool: SharedVirtualLiquidityPool,
}

impl MarketFixture {
    pub fn balanced() -> Self {
        Self::with_recovery(Box::new(SimpleRecovery::new(10).unwrap()))
    }

    pub fn with_recovery(recovery: Box<dyn RecoveryPolicy>) -> Self {
        let stablecoin =
            Token::algorithmic_stablecoin("AS", 1_000_000.0, 800_000.0, 1.0, 1.0).unwrap();
        let collateral = Token::collateral("CT", 50_000.0, 40_000.0, 50.0).unwrap();
        let reference = Token::reference("USD");
        let formula: Arc<dyn SwapFormula> = Arc::new(ConstantProductFormula);

        let stablecoin_pool = Arc::new(RwLock::new(
            LiquidityPool::new(
                stablecoin.clone(),
                reference.clone(),
                5000.0,
                5000.0,
                0.0,
                Arc::clone(&formula),
            )
            .unwrap(),
        ));
        let collateral_pool = Arc::new(RwLock::new(
            LiquidityPool::new(
                collateral.clone(),
                reference.clone(),
                100.0,
                5000.0,
                0.0,
                Arc::clone(&formula),
            )
            .unwrap(),
        ));
        let virtual_pool = Arc::new(RwLock::new(
            VirtualLiquidityPool::new(
                stablecoin.clone(),
                collateral.clone(),
                1000.0,
                0.0,
                formula,
                recovery,
            )
            .unwrap(),
        ));

        Self {
            stablecoin,
            collateral,
            reference,
            stablecoin_pool,
            collateral_pool,
            virtual_pool,
        }
    }

    /// Re-derives both token prices from the pools, as the orchestrator
    /// does after every batch of trades.
    pub fn mark_prices(&self) {
        let stablecoin_price = self.stablecoin_pool.read().implied_price_token_a();
        let collateral_price = self.collateral_pool.read().implied_price_token_a();
        self.stablecoin.set_price(stablecoin_price).unwrap();
        self.collateral.set_price(collateral_price).unwrap();
    }
}
