//! Bounded scalar maximization for unimodal objectives.
//!
//! Golden-section search over a closed interval. The profit curves this
//! solver runs against are unimodal by construction (AMM slippage makes
//! marginal profit strictly decreasing past the optimum), which is exactly
//! the assumption golden-section needs.

use thiserror::Error;

/// Distinct from [`crate::AmmError`] so callers can tell "the trade was
/// invalid" apart from "the optimizer gave up" and skip a step instead of
/// aborting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("invalid bracket [{lower}, {upper}] for bounded maximization")]
    InvalidBracket { lower: f64, upper: f64 },

    #[error(
        "bounded maximization did not converge within {max_iterations} iterations \
         (bracket width {width})"
    )]
    NoConvergence { max_iterations: u32, width: f64 },
}

/// Result of a bounded maximization.
#[derive(Debug, Clone, Copy)]
pub struct ScalarMaximum {
    /// Argument achieving the maximum, within the requested tolerance.
    pub argmax: f64,
    /// Objective value at `argmax`.
    pub value: f64,
    /// Iterations consumed before the bracket collapsed.
    pub iterations: u32,
}

/// Maximizes a unimodal `objective` over `[lower, upper]`.
///
/// Converges when the bracket width drops below `x_tolerance`; fails with
/// [`SolverError::NoConvergence`] if that does not happen within
/// `max_iterations` interval reductions.
pub fn maximize_scalar_bounded<F>(
    objective: F,
    lower: f64,
    upper: f64,
    x_tolerance: f64,
    max_iterations: u32,
) -> Result<ScalarMaximum, SolverError>
where
    F: Fn(f64) -> f64,
{
    if !lower.is_finite() || !upper.is_finite() || lower >= upper || x_tolerance <= 0.0 {
        return Err(SolverError::InvalidBracket { lower, upper });
    }

    let inv_phi = (5.0_f64.sqrt() - 1.0) / 2.0;

    let mut a = lower;
    let mut b = upper;
    let mut c = b - (b - a) * inv_phi;
    let mut d = a + (b - a) * inv_phi;
    let mut value_c = objective(c);
    let mut value_d = objective(d);

    for iteration in 1..=max_iterations {
        if (b - a) <= x_tolerance {
            let (argmax, value) = if value_c > value_d {
                (c, value_c)
            } else {
                (d, value_d)
            };
            return Ok(ScalarMaximum {
                argmax,
                value,
                iterations: iteration,
            });
        }
        if value_c > value_d {
            b = d;
            d = c;
            value_d = value_c;
            c = b - (b - a) * inv_phi;
            value_c = objective(c);
        } else {
            a = c;
            c = d;
            value_c = value_d;
            d = a + (b - a) * inv_phi;
            value_d = objective(d);
        }
    }

    Err(SolverError::NoConvergence {
        max_iterations,
        width: b - a,
    })
}
