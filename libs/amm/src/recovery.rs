//! Recovery policies: how the virtual pool's delta relaxes toward zero.

use std::collections::VecDeque;
use std::fmt;

use crate::error::AmmError;

/// Nine peg-proximity thresholds scanned from the top when sizing the
/// windowed policy's schedule.
const PRICE_THRESHOLDS: [f64; 9] = [0.95, 0.955, 0.96, 0.965, 0.97, 0.975, 0.98, 0.985, 0.99];

/// Policy hook pair invoked by the virtual pool: `update_delta` after
/// every swap, `restore_delta` once per replenishing call. The pool owns
/// delta; policies transform it and keep their own bookkeeping.
pub trait RecoveryPolicy: Send + Sync + fmt::Debug {
    /// Folds a net stablecoin flow into delta.
    fn update_delta(&mut self, delta: f64, variation: f64) -> f64;

    /// Relaxes delta one step toward zero. `stablecoin_price` is the last
    /// observed reference price of the stablecoin.
    fn restore_delta(&mut self, delta: f64, stablecoin_price: f64) -> Result<f64, AmmError>;

    /// Returns the policy's bookkeeping to its deterministic zero state.
    fn reset(&mut self);
}

/// Exponential decay of delta, directly inspired by the replenishing rule
/// of the original Terra virtual pool: each call multiplies delta by
/// `1 - 1/T`, giving a half-life of roughly `T * ln 2` steps.
#[derive(Debug, Clone)]
pub struct SimpleRecovery {
    pool_recovery_period: u32,
}

impl SimpleRecovery {
    pub fn new(pool_recovery_period: u32) -> Result<Self, AmmError> {
        if pool_recovery_period == 0 {
            return Err(AmmError::InvalidRecoveryWindow { requested: 0 });
        }
        Ok(Self {
            pool_recovery_period,
        })
    }

    pub fn pool_recovery_period(&self) -> u32 {
        self.pool_recovery_period
    }
}

impl RecoveryPolicy for SimpleRecovery {
    fn update_delta(&mut self, delta: f64, variation: f64) -> f64 {
        delta + variation
    }

    fn restore_delta(&mut self, delta: f64, _stablecoin_price: f64) -> Result<f64, AmmError> {
        Ok(delta * (1.0 - 1.0 / f64::from(self.pool_recovery_period)))
    }

    fn reset(&mut self) {}
}

/// Windowed recovery: a ring buffer of scheduled partial corrections,
/// one consumed per replenishing call.
///
/// Every swap spreads its delta contribution evenly across the window.
/// Each replenishing call first resizes the window according to how close
/// the stablecoin trades to its peg (further below peg means a shorter
/// window, i.e. faster recovery), conserving the total scheduled
/// correction, then consumes the oldest slot.
#[derive(Debug, Clone)]
pub struct WindowedRecovery {
    pool_recovery_period: usize,
    restore_values: VecDeque<f64>,
}

impl WindowedRecovery {
    pub fn new(pool_recovery_period: usize) -> Result<Self, AmmError> {
        if pool_recovery_period == 0 {
            return Err(AmmError::InvalidRecoveryWindow { requested: 0 });
        }
        let mut restore_values = VecDeque::with_capacity(pool_recovery_period);
        restore_values.resize(pool_recovery_period, 0.0);
        Ok(Self {
            pool_recovery_period,
            restore_values,
        })
    }

    pub fn pool_recovery_period(&self) -> usize {
        self.pool_recovery_period
    }

    /// Currently scheduled corrections, oldest first.
    pub fn restore_values(&self) -> &VecDeque<f64> {
        &self.restore_values
    }

    /// Window length implied by the stablecoin's peg proximity: the first
    /// threshold (scanned from 0.99 downward, index `i`) under the price
    /// yields `round(T * (1 - i/10))`; at or below 0.95 the window
    /// collapses to a single slot. Clamped to `1..=T`.
    pub fn target_window_length(&self, stablecoin_price: f64) -> usize {
        let period = self.pool_recovery_period as f64;
        let mut new_length = 1usize;
        for (i, threshold) in PRICE_THRESHOLDS.iter().rev().enumerate() {
            if stablecoin_price > *threshold {
                // Round to 5 decimals first so float fuzz in the product
                // cannot flip the integer rounding at a boundary.
                let scaled = (period * (1.0 - i as f64 * 0.1) * 1e5).round() / 1e5;
                new_length = scaled.round() as usize;
                break;
            }
        }
        new_length.clamp(1, self.pool_recovery_period)
    }

    /// Resizes the window to `new_length`. Shrinking redistributes the sum
    /// of the dropped slots evenly over the retained ones, conserving the
    /// total scheduled correction; growing pads with zeros.
    pub fn shrink_restore_values(&mut self, new_length: usize) -> Result<(), AmmError> {
        if new_length < 1 {
            return Err(AmmError::InvalidRecoveryWindow {
                requested: new_length,
            });
        }
        if new_length >= self.restore_values.len() {
            self.restore_values.resize(new_length, 0.0);
            return Ok(());
        }
        let excess: f64 = self.restore_values.iter().skip(new_length).sum();
        self.restore_values.truncate(new_length);
        let redistributed = excess / new_length as f64;
        for value in self.restore_values.iter_mut() {
            *value += redistributed;
        }
        Ok(())
    }
}

impl RecoveryPolicy for WindowedRecovery {
    fn update_delta(&mut self, delta: f64, variation: f64) -> f64 {
        let spread = variation / self.restore_values.len() as f64;
        for value in self.restore_values.iter_mut() {
            *value += spread;
        }
        delta + variation
    }

    fn restore_delta(&mut self, delta: f64, stablecoin_price: f64) -> Result<f64, AmmError> {
        let target = self.target_window_length(stablecoin_price);
        self.shrink_restore_values(target)?;
        // Consume the oldest scheduled correction and shift the window.
        let consumed = self.restore_values.pop_front().unwrap_or(0.0);
        self.restore_values.push_back(0.0);
        Ok(delta - consumed)
    }

    fn reset(&mut self) {
        self.restore_values.clear();
        self.restore_values.resize(self.pool_recovery_period, 0.0);
    }
}
