//! # pegsim Types Library
//!
//! Shared domain types for the pegsim market simulation.
//!
//! ## Design Philosophy
//!
//! - **Handle identity**: tokens are shared, mutable collaborators. A
//!   [`Token`] is a cheap-to-clone handle; two handles refer to the same
//!   token only if they share the same allocation. Equality by value is
//!   deliberately not provided.
//! - **Role fixed at construction**: whether a token is an algorithmic
//!   stablecoin, a collateral token, or the reference numéraire is decided
//!   when the token is created and never inspected via downcasting.
//! - **Validated mutation**: every setter enforces the supply invariant
//!   `0 <= free_supply <= supply` and positive prices, returning a typed
//!   [`TokenError`] instead of silently clamping.

pub mod token;

pub use token::{Token, TokenError, TokenRole};
