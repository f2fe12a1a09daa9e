//! Stochastic trade and wallet generators.
//!
//! Purchase generators turn market sentiment into signed trade amounts;
//! wallet generators bound each trade by a plausible holder balance so a
//! single simulated actor can never move more than one wallet's worth.

use rand::rngs::StdRng;
use rand::Rng;

use pegsim_types::Token;

use crate::error::SimulationError;

/// Draws a standard-normal variate via Box–Muller and scales it.
fn sample_normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return mean;
    }
    let u1: f64 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.gen();
    mean + std_dev * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// Produces a bounded random wallet balance given a free-supply ceiling.
pub trait WalletsGenerator {
    fn random_wallet(&mut self, total_free_supply: f64) -> Result<f64, SimulationError>;
}

/// Wallet balances follow an exponential distribution calibrated so that
/// a balance equal to the entire free supply has the configured tail
/// probability. Draws above the ceiling are rejected and retried.
pub struct ExponentialWalletsGenerator {
    probability_associated_to_total_free_token: f64,
    rng: StdRng,
}

impl ExponentialWalletsGenerator {
    pub fn new(
        probability_associated_to_total_free_token: f64,
        rng: StdRng,
    ) -> Result<Self, SimulationError> {
        if !(0.0 < probability_associated_to_total_free_token
            && probability_associated_to_total_free_token < 1.0)
        {
            return Err(SimulationError::InvalidParameter {
                name: "probability_associated_to_total_free_token",
                value: probability_associated_to_total_free_token,
            });
        }
        Ok(Self {
            probability_associated_to_total_free_token,
            rng,
        })
    }
}

impl WalletsGenerator for ExponentialWalletsGenerator {
    fn random_wallet(&mut self, total_free_supply: f64) -> Result<f64, SimulationError> {
        if total_free_supply < 0.0 {
            return Err(SimulationError::InvalidParameter {
                name: "total_free_supply",
                value: total_free_supply,
            });
        }
        if total_free_supply == 0.0 {
            return Ok(0.0);
        }

        let exp_rate =
            -self.probability_associated_to_total_free_token.ln() / total_free_supply;
        loop {
            // Inverse-CDF exponential draw; 1 - u keeps the argument in (0, 1].
            let uniform: f64 = self.rng.gen();
            let wallet_balance = -(1.0 - uniform).ln() / exp_rate;
            if wallet_balance <= total_free_supply {
                return Ok(wallet_balance);
            }
        }
    }
}

/// Produces a signed trade amount for a token each step: positive sells
/// into the pool, negative buys from it.
pub trait PurchaseGenerator {
    fn next_trade(&mut self) -> Result<f64, SimulationError>;

    /// The token whose trades this generator simulates.
    fn token(&self) -> &Token;
}

/// Parameters of the seignorage-model purchase generator.
#[derive(Debug, Clone, Copy)]
pub struct PurchaseParams {
    /// Variance of the volume random walk.
    pub volume_variance: f64,
    /// Starting trade-volume scale.
    pub initial_volume: f64,
    /// Std deviation of the per-trade Gaussian.
    pub variance: f64,
    /// Mean of the per-trade Gaussian outside the panic regime.
    pub mean: f64,
    /// Peg band half-width below which the market panics.
    pub threshold: f64,
}

impl Default for PurchaseParams {
    fn default() -> Self {
        Self {
            volume_variance: 1000.0,
            initial_volume: 1000.0,
            variance: 1.0,
            mean: 0.0,
            threshold: 0.05,
        }
    }
}

/// Random trade generator for a seignorage-model token (the stablecoin or
/// its collateral). Trade direction and size follow a Gaussian whose mean
/// shifts into sell pressure whenever the tracked stablecoin slips below
/// its peg band, scaled by a random-walk trade volume and capped by a
/// random wallet balance.
pub struct SeignorageRandomPurchaseGenerator {
    token: Token,
    stablecoin: Token,
    wallets_generator: ExponentialWalletsGenerator,
    params: PurchaseParams,
    volume: f64,
    mean: f64,
    panic_response: fn(f64) -> f64,
    rng: StdRng,
}

/// Default panic response: sell pressure grows as the price sinks below
/// the peg (`1/p - 1` is zero at the peg and increases hyperbolically).
fn default_panic_response(price: f64) -> f64 {
    1.0 / price - 1.0
}

impl SeignorageRandomPurchaseGenerator {
    /// `token` is the asset being traded; `stablecoin` is the pegged token
    /// whose price drives the panic regime (pass the same handle twice
    /// when the traded asset is the stablecoin itself).
    pub fn new(
        token: Token,
        stablecoin: Token,
        wallets_generator: ExponentialWalletsGenerator,
        params: PurchaseParams,
        rng: StdRng,
    ) -> Result<Self, SimulationError> {
        for (name, value) in [
            ("volume_variance", params.volume_variance),
            ("initial_volume", params.initial_volume),
            ("variance", params.variance),
            ("mean", params.mean),
        ] {
            if value < 0.0 {
                return Err(SimulationError::InvalidParameter { name, value });
            }
        }
        if params.threshold <= 0.0 {
            return Err(SimulationError::InvalidParameter {
                name: "threshold",
                value: params.threshold,
            });
        }
        if stablecoin.peg().is_none() {
            return Err(SimulationError::MismatchedCollaborators(
                "purchase generator requires an algorithmic stablecoin to track",
            ));
        }
        Ok(Self {
            token,
            stablecoin,
            wallets_generator,
            volume: params.initial_volume,
            mean: params.mean,
            params,
            panic_response: default_panic_response,
            rng,
        })
    }

    pub fn with_panic_response(mut self, panic_response: fn(f64) -> f64) -> Self {
        self.panic_response = panic_response;
        self
    }

    /// Shifts the Gaussian mean with the stablecoin's peg proximity:
    /// zero while the market is stable, panic-driven sell pressure once
    /// the price leaves the peg band.
    fn update_mean(&mut self) {
        let price = self.stablecoin.price();
        let peg = self.stablecoin.peg().unwrap_or(1.0);
        if price > peg - self.params.threshold {
            self.mean = 0.0;
        } else {
            self.mean = self.params.mean + (self.panic_response)(price);
        }
    }

    fn update_volume(&mut self) -> f64 {
        self.volume =
            (self.volume + sample_normal(&mut self.rng, 0.0, self.params.volume_variance)).abs();
        self.volume
    }

    #[cfg(test)]
    fn current_mean(&self) -> f64 {
        self.mean
    }
}

impl PurchaseGenerator for SeignorageRandomPurchaseGenerator {
    fn next_trade(&mut self) -> Result<f64, SimulationError> {
        self.update_mean();
        let volume = self.update_volume();
        let dollars_trade_amount =
            sample_normal(&mut self.rng, self.mean, self.params.variance) * volume;
        let trade_amount = dollars_trade_amount / self.token.price();
        let random_wallet_balance = self
            .wallets_generator
            .random_wallet(self.token.free_supply())?;
        Ok(trade_amount.min(random_wallet_balance))
    }

    fn token(&self) -> &Token {
        &self.token
    }
}
