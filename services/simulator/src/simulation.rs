//! Simulation runner: wires the economy from a configuration and records
//! per-step telemetry.

use std::sync::Arc;

use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use arbitrage_strategy::{
    SharedLiquidityPool, SharedVirtualLiquidityPool, ThreePoolsArbitrageOptimizer,
};
use pegsim_amm::{
    ConstantProductFormula, LiquidityPool, RecoveryPolicy, SimpleRecovery, SwapFormula,
    VirtualLiquidityPool, WindowedRecovery,
};
use pegsim_types::Token;

use crate::config::{RecoveryPolicyKind, SimulationConfig};
use crate::error::SimulationError;
use crate::generators::{
    ExponentialWalletsGenerator, PurchaseParams, SeignorageRandomPurchaseGenerator,
};
use crate::market::MarketSimulator;

/// Per-step telemetry of a run. All vectors share one length: the number
/// of completed iterations. Each entry is the state observed at the start
/// of its step.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SimulationHistory {
    pub stablecoin_price: Vec<f64>,
    pub collateral_price: Vec<f64>,
    pub stablecoin_supply: Vec<f64>,
    pub collateral_supply: Vec<f64>,
    pub stablecoin_free_supply: Vec<f64>,
    pub collateral_free_supply: Vec<f64>,
    pub virtual_pool_delta: Vec<f64>,
    pub executed_arbitrages: usize,
}

impl SimulationHistory {
    fn record(&mut self, stablecoin: &Token, collateral: &Token, delta: f64) {
        self.stablecoin_price.push(stablecoin.price());
        self.collateral_price.push(collateral.price());
        self.stablecoin_supply.push(stablecoin.supply());
        self.collateral_supply.push(collateral.supply());
        self.stablecoin_free_supply.push(stablecoin.free_supply());
        self.collateral_free_supply.push(collateral.free_supply());
        self.virtual_pool_delta.push(delta);
    }

    pub fn len(&self) -> usize {
        self.stablecoin_price.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stablecoin_price.is_empty()
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    /// All configured iterations completed.
    Completed,
    /// The stablecoin system collapsed at the given step; the history
    /// covers the steps before it.
    Collapsed { at_step: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationRunResult {
    pub history: SimulationHistory,
    pub outcome: RunOutcome,
}

/// A fully wired three-pool economy ready to run.
pub struct ThreePoolsSimulation {
    stablecoin: Token,
    collateral: Token,
    stablecoin_pool: SharedLiquidityPool,
    collateral_pool: SharedLiquidityPool,
    virtual_pool: SharedVirtualLiquidityPool,
    market: MarketSimulator,
    iterations: usize,
}

impl ThreePoolsSimulation {
    /// Builds tokens, pools, generators and the optimizer from a validated
    /// configuration. Pool reserves derive from the configured supplies:
    /// the non-circulating share of each token sits in its pool, priced
    /// against the matching reference quantity.
    pub fn from_config(config: &SimulationConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let stablecoin = Token::algorithmic_stablecoin(
            config.stablecoin.name.clone(),
            config.stablecoin.supply,
            config.stablecoin.free_supply,
            config.stablecoin.price,
            config.stablecoin.peg,
        )?;
        let collateral = Token::collateral(
            config.collateral.name.clone(),
            config.collateral.supply,
            config.collateral.free_supply,
            config.collateral.price,
        )?;
        let reference = Token::reference("USD");
        let formula: Arc<dyn SwapFormula> = Arc::new(ConstantProductFormula);

        let stablecoin_pool_quantity = config.stablecoin.supply - config.stablecoin.free_supply;
        let stablecoin_pool: SharedLiquidityPool = Arc::new(RwLock::new(LiquidityPool::new(
            stablecoin.clone(),
            reference.clone(),
            stablecoin_pool_quantity,
            stablecoin_pool_quantity * config.stablecoin.price,
            config.stablecoin.pool_fee,
            Arc::clone(&formula),
        )?));

        let collateral_pool_quantity = config.collateral.supply - config.collateral.free_supply;
        let collateral_pool: SharedLiquidityPool = Arc::new(RwLock::new(LiquidityPool::new(
            collateral.clone(),
            reference,
            collateral_pool_quantity,
            collateral_pool_quantity * config.collateral.price,
            config.collateral.pool_fee,
            Arc::clone(&formula),
        )?));

        let recovery: Box<dyn RecoveryPolicy> = match config.virtual_pool.recovery_policy {
            RecoveryPolicyKind::Simple => {
                Box::new(SimpleRecovery::new(config.virtual_pool.recovery_period)?)
            }
            RecoveryPolicyKind::Windowed => Box::new(WindowedRecovery::new(
                config.virtual_pool.recovery_period as usize,
            )?),
        };
        let virtual_pool: SharedVirtualLiquidityPool =
            Arc::new(RwLock::new(VirtualLiquidityPool::new(
                stablecoin.clone(),
                collateral.clone(),
                config.virtual_pool.base_quantity,
                config.virtual_pool.fee,
                formula,
                recovery,
            )?));

        let params = PurchaseParams {
            volume_variance: config.generators.volume_variance,
            initial_volume: config.generators.swap_volume,
            variance: config.generators.variance,
            mean: config.generators.mean,
            threshold: config.generators.panic_threshold,
        };
        // Distinct deterministic streams per stochastic component.
        let seed = config.run.seed;
        let stablecoin_generator = SeignorageRandomPurchaseGenerator::new(
            stablecoin.clone(),
            stablecoin.clone(),
            ExponentialWalletsGenerator::new(
                config.generators.wallet_probability,
                StdRng::seed_from_u64(seed),
            )?,
            params,
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )?;
        let collateral_generator = SeignorageRandomPurchaseGenerator::new(
            collateral.clone(),
            stablecoin.clone(),
            ExponentialWalletsGenerator::new(
                config.generators.wallet_probability,
                StdRng::seed_from_u64(seed.wrapping_add(2)),
            )?,
            params,
            StdRng::seed_from_u64(seed.wrapping_add(3)),
        )?;

        let optimizer = ThreePoolsArbitrageOptimizer::new(
            stablecoin_pool.clone(),
            collateral_pool.clone(),
            virtual_pool.clone(),
            config.arbitrage.clone(),
        )?;

        let market = MarketSimulator::new(
            stablecoin_pool.clone(),
            collateral_pool.clone(),
            virtual_pool.clone(),
            Box::new(stablecoin_generator),
            Box::new(collateral_generator),
            Box::new(optimizer),
            config.run.collapse_floor,
        )?;

        Ok(Self {
            stablecoin,
            collateral,
            stablecoin_pool,
            collateral_pool,
            virtual_pool,
            market,
            iterations: config.run.iterations,
        })
    }

    pub fn stablecoin_pool(&self) -> &SharedLiquidityPool {
        &self.stablecoin_pool
    }

    pub fn collateral_pool(&self) -> &SharedLiquidityPool {
        &self.collateral_pool
    }

    pub fn virtual_pool(&self) -> &SharedVirtualLiquidityPool {
        &self.virtual_pool
    }

    /// Runs the configured number of iterations, recording telemetry at
    /// the start of every step. A stablecoin collapse ends the run early
    /// with the partial history preserved; any other failure aborts.
    pub fn run(&mut self) -> Result<SimulationRunResult, SimulationError> {
        let mut history = SimulationHistory::default();

        for step in 0..self.iterations {
            history.record(
                &self.stablecoin,
                &self.collateral,
                self.virtual_pool.read().delta(),
            );
            match self.market.execute_step() {
                Ok(outcome) => {
                    if outcome.arbitrage.is_some() {
                        history.executed_arbitrages += 1;
                    }
                }
                Err(SimulationError::StablecoinCollapse {
                    collateral_price,
                    floor,
                }) => {
                    warn!(
                        collateral_price,
                        floor, step, "stablecoin system collapsed; ending the run"
                    );
                    return Ok(SimulationRunResult {
                        history,
                        outcome: RunOutcome::Collapsed { at_step: step },
                    });
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            iterations = self.iterations,
            executed_arbitrages = history.executed_arbitrages,
            final_delta = self.virtual_pool.read().delta(),
            "simulation completed"
        );
        Ok(SimulationRunResult {
            history,
            outcome: RunOutcome::Completed,
        })
    }
}
