//! Structured error types for pool and formula failures.

use pegsim_types::TokenError;
use thiserror::Error;

/// Errors raised by swap formulas, liquidity pools and the virtual pool.
///
/// Validation errors reject a call before any state changes; invariant
/// violations ([`AmmError::NegativeReserve`],
/// [`AmmError::OutputExceedsReserve`]) are fatal for the current step.
#[derive(Error, Debug)]
pub enum AmmError {
    #[error("{name} must be positive, got {value}")]
    NonPositiveQuantity { name: &'static str, value: f64 },

    #[error("{name} must be non-negative, got {value}")]
    NegativeQuantity { name: &'static str, value: f64 },

    #[error("pool fee must be in [0, 1), got {value}")]
    FeeOutOfRange { value: f64 },

    #[error("a liquidity pool requires two distinct tokens")]
    IdenticalTokens,

    #[error("token '{name}' does not belong to this liquidity pool")]
    UnknownToken { name: String },

    #[error("requested output {output_quantity} cannot be paid from a reserve of {output_reserve}")]
    OutputExceedsReserve {
        output_quantity: f64,
        output_reserve: f64,
    },

    #[error("swap would drive pool reserves negative ({quantity_token_a}, {quantity_token_b})")]
    NegativeReserve {
        quantity_token_a: f64,
        quantity_token_b: f64,
    },

    #[error("recovery window length must be at least 1, got {requested}")]
    InvalidRecoveryWindow { requested: usize },

    #[error(transparent)]
    Token(#[from] TokenError),
}
