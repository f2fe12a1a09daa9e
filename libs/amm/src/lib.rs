//! # pegsim AMM Library - Constant-Product Market Mathematics
//!
//! ## Purpose
//!
//! Mathematical core of the pegsim market simulation: swap formulas over
//! pooled reserves, liquidity pools with fee handling and supply
//! bookkeeping, the peg-defending virtual liquidity pool with its
//! delta/recovery dynamics, and the bounded scalar solver used to size
//! profit-maximizing trades.
//!
//! ## Integration Points
//!
//! - **Input Sources**: token handles from `pegsim-types`, trade amounts
//!   from purchase generators and the arbitrage strategy
//! - **Output Destinations**: arbitrage strategy (read-only quoting and
//!   executed swaps), simulator telemetry (reserve and delta accessors)
//! - **Invariants**: constant product `x*y = k` net of fees, reserves
//!   strictly positive, virtual-pool reserves derived from delta
//! - **Error Handling**: typed [`AmmError`] for validation and invariant
//!   violations, [`SolverError`] for optimizer non-convergence
//!
//! ## Architecture Role
//!
//! ```text
//! Purchase Generators → [LiquidityPool] ← Arbitrage Strategy
//!                            ↓                  ↓
//!                      [SwapFormula]    [maximize_scalar_bounded]
//!                            ↓
//!                  [VirtualLiquidityPool] ← Recovery Policies
//! ```

pub mod error;
pub mod formula;
pub mod pool;
pub mod recovery;
pub mod solver;
pub mod virtual_pool;

pub use error::AmmError;
pub use formula::{ConstantProductFormula, SwapFormula};
pub use pool::LiquidityPool;
pub use recovery::{RecoveryPolicy, SimpleRecovery, WindowedRecovery};
pub use solver::{maximize_scalar_bounded, ScalarMaximum, SolverError};
pub use virtual_pool::VirtualLiquidityPool;
