//! Swap formulas: pure pricing math over pooled reserves.

use std::fmt;

use crate::error::AmmError;

fn ensure_positive(name: &'static str, value: f64) -> Result<(), AmmError> {
    if value <= 0.0 {
        return Err(AmmError::NonPositiveQuantity { name, value });
    }
    Ok(())
}

/// Pricing strategy for a liquidity pool. Implementations are stateless:
/// every call receives the reserves it should price against.
pub trait SwapFormula: Send + Sync + fmt::Debug {
    /// Output amount obtained by depositing `input_quantity` against the
    /// given reserves.
    fn apply(
        &self,
        input_quantity: f64,
        input_reserve: f64,
        output_reserve: f64,
    ) -> Result<f64, AmmError>;

    /// Input amount required to withdraw `output_quantity` — the exact
    /// inverse of [`SwapFormula::apply`] under the same invariant:
    /// `apply(inverse_apply(q, r_i, r_o), r_i, r_o) ≈ q`.
    fn inverse_apply(
        &self,
        output_quantity: f64,
        input_reserve: f64,
        output_reserve: f64,
    ) -> Result<f64, AmmError>;

    /// Output-side reserve consistent with the invariant after the
    /// input-side reserve moves to `new_input_reserve`. A lower target is
    /// treated as removing input (an inverse swap with the reserve roles
    /// exchanged, growing the output reserve); a higher target as adding
    /// input (a forward swap, shrinking it). An unchanged target leaves
    /// the output reserve untouched.
    fn compute_reserve(
        &self,
        input_reserve: f64,
        output_reserve: f64,
        new_input_reserve: f64,
    ) -> Result<f64, AmmError> {
        ensure_positive("new input reserve", new_input_reserve)?;
        if new_input_reserve < input_reserve {
            let withdrawn = input_reserve - new_input_reserve;
            Ok(output_reserve + self.inverse_apply(withdrawn, output_reserve, input_reserve)?)
        } else if new_input_reserve > input_reserve {
            let deposited = new_input_reserve - input_reserve;
            Ok(output_reserve - self.apply(deposited, input_reserve, output_reserve)?)
        } else {
            Ok(output_reserve)
        }
    }
}

/// The constant-product formula: swaps preserve `k = x * y` exactly
/// (any fee is applied upstream by the pool).
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstantProductFormula;

impl SwapFormula for ConstantProductFormula {
    fn apply(
        &self,
        input_quantity: f64,
        input_reserve: f64,
        output_reserve: f64,
    ) -> Result<f64, AmmError> {
        ensure_positive("input quantity", input_quantity)?;
        ensure_positive("input reserve", input_reserve)?;
        ensure_positive("output reserve", output_reserve)?;
        Ok(output_reserve * input_quantity / (input_reserve + input_quantity))
    }

    fn inverse_apply(
        &self,
        output_quantity: f64,
        input_reserve: f64,
        output_reserve: f64,
    ) -> Result<f64, AmmError> {
        ensure_positive("output quantity", output_quantity)?;
        ensure_positive("input reserve", input_reserve)?;
        ensure_positive("output reserve", output_reserve)?;
        if output_quantity >= output_reserve {
            return Err(AmmError::OutputExceedsReserve {
                output_quantity,
                output_reserve,
            });
        }
        Ok(input_reserve * output_quantity / (output_reserve - output_quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn apply_known_value() {
        // 5000:5000 reserves, deposit 100: 5000 * 100 / 5100
        let out = ConstantProductFormula
            .apply(100.0, 5000.0, 5000.0)
            .unwrap();
        assert!((out - 98.03921568627452).abs() < 1e-9);
    }

    #[test]
    fn apply_rejects_non_positive_arguments() {
        let formula = ConstantProductFormula;
        assert!(matches!(
            formula.apply(0.0, 5000.0, 5000.0),
            Err(AmmError::NonPositiveQuantity { name: "input quantity", .. })
        ));
        assert!(matches!(
            formula.apply(10.0, -1.0, 5000.0),
            Err(AmmError::NonPositiveQuantity { name: "input reserve", .. })
        ));
        assert!(matches!(
            formula.apply(10.0, 5000.0, 0.0),
            Err(AmmError::NonPositiveQuantity { name: "output reserve", .. })
        ));
    }

    #[test]
    fn inverse_apply_rejects_draining_the_reserve() {
        assert!(matches!(
            ConstantProductFormula.inverse_apply(5000.0, 5000.0, 5000.0),
            Err(AmmError::OutputExceedsReserve { .. })
        ));
        assert!(matches!(
            ConstantProductFormula.inverse_apply(6000.0, 5000.0, 5000.0),
            Err(AmmError::OutputExceedsReserve { .. })
        ));
    }

    #[test]
    fn compute_reserve_matches_both_swap_directions() {
        let formula = ConstantProductFormula;
        // Adding 100 to the input side mirrors a forward swap.
        let shrunk = formula.compute_reserve(5000.0, 5000.0, 5100.0).unwrap();
        let out = formula.apply(100.0, 5000.0, 5000.0).unwrap();
        assert!((shrunk - (5000.0 - out)).abs() < 1e-9);

        // Removing 100 mirrors an inverse swap with roles exchanged.
        let grown = formula.compute_reserve(5000.0, 5000.0, 4900.0).unwrap();
        let input = formula.inverse_apply(100.0, 5000.0, 5000.0).unwrap();
        assert!((grown - (5000.0 + input)).abs() < 1e-9);
    }

    #[test]
    fn compute_reserve_unchanged_input_is_identity() {
        let out = ConstantProductFormula
            .compute_reserve(5000.0, 4200.0, 5000.0)
            .unwrap();
        assert_eq!(out, 4200.0);
    }

    proptest! {
        #[test]
        fn apply_then_inverse_round_trips(
            quantity in 1e-3..1e6f64,
            input_reserve in 1.0..1e9f64,
            output_reserve in 1.0..1e9f64,
        ) {
            let formula = ConstantProductFormula;
            let out = formula.apply(quantity, input_reserve, output_reserve).unwrap();
            prop_assume!(out < output_reserve);
            let back = formula.inverse_apply(out, input_reserve, output_reserve).unwrap();
            prop_assert!((back - quantity).abs() <= 1e-6 * quantity.max(1.0));
        }

        #[test]
        fn apply_preserves_constant_product(
            quantity in 1e-3..1e6f64,
            input_reserve in 1.0..1e9f64,
            output_reserve in 1.0..1e9f64,
        ) {
            let out = ConstantProductFormula
                .apply(quantity, input_reserve, output_reserve)
                .unwrap();
            let k_before = input_reserve * output_reserve;
            let k_after = (input_reserve + quantity) * (output_reserve - out);
            prop_assert!((k_after - k_before).abs() <= 1e-9 * k_before);
        }
    }
}
