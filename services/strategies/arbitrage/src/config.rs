//! Arbitrage strategy configuration.

use serde::{Deserialize, Serialize};

/// Parameters of the three-pool arbitrage optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Upper bound on the reference-token input of a single round trip.
    pub max_arbitrage_input: f64,
    /// Guard constant reserved for a future tie-break policy between the
    /// two round-trip directions; currently unused.
    pub threshold: f64,
    /// Absolute x-tolerance of the bounded solver.
    pub solver_x_tolerance: f64,
    /// Iteration cap of the bounded solver.
    pub solver_max_iterations: u32,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_arbitrage_input: 1e6,
            threshold: 0.001,
            solver_x_tolerance: 1e-5,
            solver_max_iterations: 500,
        }
    }
}

impl OptimizerConfig {
    /// Validates parameter ranges.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_arbitrage_input <= 1.0 {
            anyhow::bail!("max_arbitrage_input must exceed the probe amount of 1.0");
        }
        if self.threshold < 0.0 {
            anyhow::bail!("threshold must be non-negative");
        }
        if self.solver_x_tolerance <= 0.0 {
            anyhow::bail!("solver_x_tolerance must be positive");
        }
        if self.solver_max_iterations == 0 {
            anyhow::bail!("solver_max_iterations must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(OptimizerConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let mut config = OptimizerConfig::default();
        config.max_arbitrage_input = 1.0;
        assert!(config.validate().is_err());

        let mut config = OptimizerConfig::default();
        config.solver_x_tolerance = 0.0;
        assert!(config.validate().is_err());

        let mut config = OptimizerConfig::default();
        config.solver_max_iterations = 0;
        assert!(config.validate().is_err());
    }
}
