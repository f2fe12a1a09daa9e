//! Simulation configuration: JSON files, environment overrides,
//! validated defaults.

use arbitrage_strategy::OptimizerConfig;
use serde::{Deserialize, Serialize};

/// Complete configuration of a simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub stablecoin: StablecoinConfig,
    pub collateral: TokenConfig,
    pub virtual_pool: VirtualPoolConfig,
    pub generators: GeneratorConfig,
    pub arbitrage: OptimizerConfig,
    pub run: RunConfig,
}

/// The pegged token and its pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StablecoinConfig {
    pub name: String,
    pub price: f64,
    pub supply: f64,
    pub free_supply: f64,
    pub pool_fee: f64,
    pub peg: f64,
}

/// A free-floating token and its pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub price: f64,
    pub supply: f64,
    pub free_supply: f64,
    pub pool_fee: f64,
}

/// Which recovery policy the virtual pool runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryPolicyKind {
    Simple,
    Windowed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualPoolConfig {
    pub base_quantity: f64,
    pub fee: f64,
    pub recovery_period: u32,
    pub recovery_policy: RecoveryPolicyKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Starting trade-volume scale of both purchase generators.
    pub swap_volume: f64,
    /// Variance of the volume random walk.
    pub volume_variance: f64,
    /// Std deviation of the per-trade Gaussian.
    pub variance: f64,
    /// Mean of the per-trade Gaussian outside the panic regime.
    pub mean: f64,
    /// Peg band half-width below which the market panics.
    pub panic_threshold: f64,
    /// Tail probability of a wallet holding the entire free supply.
    pub wallet_probability: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub iterations: usize,
    pub seed: u64,
    /// Collateral price at or below which the run counts as a collapse.
    pub collapse_floor: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stablecoin: StablecoinConfig {
                name: "AS".to_string(),
                price: 1.0,
                supply: 1_000_000.0,
                free_supply: 800_000.0,
                pool_fee: 0.003,
                peg: 1.0,
            },
            collateral: TokenConfig {
                name: "CT".to_string(),
                price: 50.0,
                supply: 50_000.0,
                free_supply: 40_000.0,
                pool_fee: 0.003,
            },
            virtual_pool: VirtualPoolConfig {
                base_quantity: 10_000.0,
                fee: 0.0,
                recovery_period: 10,
                recovery_policy: RecoveryPolicyKind::Simple,
            },
            generators: GeneratorConfig {
                swap_volume: 1000.0,
                volume_variance: 1000.0,
                variance: 1.0,
                mean: 0.0,
                panic_threshold: 0.05,
                wallet_probability: 0.001,
            },
            arbitrage: OptimizerConfig::default(),
            run: RunConfig {
                iterations: 1000,
                seed: 42,
                collapse_floor: 0.01,
            },
        }
    }
}

impl SimulationConfig {
    /// Loads configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration with environment-variable overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Overrides selected parameters from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(iterations) = std::env::var("PEGSIM_ITERATIONS") {
            if let Ok(value) = iterations.parse::<usize>() {
                self.run.iterations = value;
            }
        }
        if let Ok(seed) = std::env::var("PEGSIM_SEED") {
            if let Ok(value) = seed.parse::<u64>() {
                self.run.seed = value;
            }
        }
        if let Ok(max_input) = std::env::var("PEGSIM_MAX_ARBITRAGE_INPUT") {
            if let Ok(value) = max_input.parse::<f64>() {
                self.arbitrage.max_arbitrage_input = value;
            }
        }
        if let Ok(volume) = std::env::var("PEGSIM_SWAP_VOLUME") {
            if let Ok(value) = volume.parse::<f64>() {
                self.generators.swap_volume = value;
            }
        }
    }

    /// Saves configuration to a JSON file.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validates all parameter ranges and cross-field constraints.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (section, price, supply, free_supply, pool_fee) in [
            (
                "stablecoin",
                self.stablecoin.price,
                self.stablecoin.supply,
                self.stablecoin.free_supply,
                self.stablecoin.pool_fee,
            ),
            (
                "collateral",
                self.collateral.price,
                self.collateral.supply,
                self.collateral.free_supply,
                self.collateral.pool_fee,
            ),
        ] {
            if price <= 0.0 {
                anyhow::bail!("{section}.price must be positive");
            }
            if supply <= 0.0 {
                anyhow::bail!("{section}.supply must be positive");
            }
            if free_supply < 0.0 {
                anyhow::bail!("{section}.free_supply must be non-negative");
            }
            if free_supply >= supply {
                anyhow::bail!(
                    "{section}.free_supply must leave a positive pool reserve (supply - free_supply)"
                );
            }
            if !(0.0..1.0).contains(&pool_fee) {
                anyhow::bail!("{section}.pool_fee must lie in [0, 1)");
            }
        }
        if self.stablecoin.peg <= 0.0 {
            anyhow::bail!("stablecoin.peg must be positive");
        }
        if self.virtual_pool.base_quantity <= 0.0 {
            anyhow::bail!("virtual_pool.base_quantity must be positive");
        }
        if !(0.0..1.0).contains(&self.virtual_pool.fee) {
            anyhow::bail!("virtual_pool.fee must lie in [0, 1)");
        }
        if self.virtual_pool.recovery_period == 0 {
            anyhow::bail!("virtual_pool.recovery_period must be at least 1");
        }
        if self.generators.swap_volume < 0.0
            || self.generators.volume_variance < 0.0
            || self.generators.variance < 0.0
            || self.generators.mean < 0.0
        {
            anyhow::bail!("generator parameters must be non-negative");
        }
        if self.generators.panic_threshold <= 0.0 {
            anyhow::bail!("generators.panic_threshold must be positive");
        }
        if !(0.0 < self.generators.wallet_probability && self.generators.wallet_probability < 1.0)
        {
            anyhow::bail!("generators.wallet_probability must lie in (0, 1)");
        }
        if self.run.iterations == 0 {
            anyhow::bail!("run.iterations must be at least 1");
        }
        if self.run.collapse_floor < 0.0 {
            anyhow::bail!("run.collapse_floor must be non-negative");
        }
        self.arbitrage.validate()?;
        Ok(())
    }
}
