//! Structured error types for the simulation layer.

use arbitrage_strategy::ArbitrageError;
use pegsim_amm::AmmError;
use pegsim_types::TokenError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("mismatched simulation collaborators: {0}")]
    MismatchedCollaborators(&'static str),

    /// The collateral can no longer back the peg; the run is over.
    #[error(
        "stablecoin collapse: collateral price {collateral_price} fell to the \
         configured floor {floor}"
    )]
    StablecoinCollapse { collateral_price: f64, floor: f64 },

    #[error(transparent)]
    Arbitrage(#[from] ArbitrageError),

    #[error(transparent)]
    Amm(#[from] AmmError),

    #[error(transparent)]
    Token(#[from] TokenError),
}
