//! Liquidity pools: two-token reserves executing formula-priced swaps.

use std::fmt;
use std::sync::Arc;

use pegsim_types::Token;

use crate::error::AmmError;
use crate::formula::SwapFormula;

/// How a swap settles against the collaborating tokens' supplies.
///
/// Real pools move tokens in and out of public circulation; the virtual
/// pool destroys what it absorbs and creates what it pays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SupplyLedger {
    /// Adjust `free_supply` on both tokens, mirroring reserve movement.
    Circulating,
    /// Burn the deposited flow, mint the withdrawn flow.
    MintBurn,
}

/// A pool of two token reserves priced by a shared [`SwapFormula`].
///
/// Reserves stay strictly positive; every swap preserves the formula's
/// invariant up to the fee's deliberate erosion (`k` is non-decreasing,
/// strictly increasing whenever `fee > 0` and the amount is non-zero).
pub struct LiquidityPool {
    token_a: Token,
    token_b: Token,
    quantity_token_a: f64,
    quantity_token_b: f64,
    fee: f64,
    formula: Arc<dyn SwapFormula>,
}

impl LiquidityPool {
    pub fn new(
        token_a: Token,
        token_b: Token,
        quantity_token_a: f64,
        quantity_token_b: f64,
        fee: f64,
        formula: Arc<dyn SwapFormula>,
    ) -> Result<Self, AmmError> {
        if token_a.same_token(&token_b) {
            return Err(AmmError::IdenticalTokens);
        }
        if quantity_token_a <= 0.0 {
            return Err(AmmError::NonPositiveQuantity {
                name: "token_a reserve",
                value: quantity_token_a,
            });
        }
        if quantity_token_b <= 0.0 {
            return Err(AmmError::NonPositiveQuantity {
                name: "token_b reserve",
                value: quantity_token_b,
            });
        }
        if !(0.0..1.0).contains(&fee) {
            return Err(AmmError::FeeOutOfRange { value: fee });
        }
        Ok(Self {
            token_a,
            token_b,
            quantity_token_a,
            quantity_token_b,
            fee,
            formula,
        })
    }

    pub fn token_a(&self) -> &Token {
        &self.token_a
    }

    pub fn token_b(&self) -> &Token {
        &self.token_b
    }

    pub fn quantity_token_a(&self) -> f64 {
        self.quantity_token_a
    }

    pub fn quantity_token_b(&self) -> f64 {
        self.quantity_token_b
    }

    pub fn fee(&self) -> f64 {
        self.fee
    }

    pub fn formula(&self) -> Arc<dyn SwapFormula> {
        Arc::clone(&self.formula)
    }

    /// Price of one unit of `token_a` expressed in `token_b`, as implied
    /// by the current reserve ratio.
    pub fn implied_price_token_a(&self) -> f64 {
        self.quantity_token_b / self.quantity_token_a
    }

    /// Executes a swap against the pool.
    ///
    /// The sign of `amount` selects the direction: positive deposits
    /// `amount` of `token` and withdraws the computed amount of the other
    /// token; negative withdraws `|amount|` of `token` and deposits the
    /// computed amount of the other token (fee netted on the deposited
    /// side); zero is a no-op returning a zero amount.
    ///
    /// Returns the other token and the amount of it that changed hands.
    pub fn swap(&mut self, token: &Token, amount: f64) -> Result<(Token, f64), AmmError> {
        self.swap_with_ledger(token, amount, SupplyLedger::Circulating)
    }

    pub(crate) fn swap_with_ledger(
        &mut self,
        token: &Token,
        amount: f64,
        ledger: SupplyLedger,
    ) -> Result<(Token, f64), AmmError> {
        let token_is_a = if token.same_token(&self.token_a) {
            true
        } else if token.same_token(&self.token_b) {
            false
        } else {
            return Err(AmmError::UnknownToken { name: token.name() });
        };
        let other_token = if token_is_a {
            self.token_b.clone()
        } else {
            self.token_a.clone()
        };

        let other_amount = if amount > 0.0 {
            // Forward: `token` is deposited, the other side pays out.
            let (input_reserve, output_reserve) = if token_is_a {
                (self.quantity_token_a, self.quantity_token_b)
            } else {
                (self.quantity_token_b, self.quantity_token_a)
            };
            let output_amount = self.compute_swap_value(amount, input_reserve, output_reserve)?;
            let new_input = input_reserve + amount;
            let new_output = output_reserve - output_amount;
            if token_is_a {
                self.update_pool_quantities(new_input, new_output)?;
            } else {
                self.update_pool_quantities(new_output, new_input)?;
            }
            output_amount
        } else if amount < 0.0 {
            // Reverse: `token` is withdrawn, the other side is deposited.
            let (input_reserve, output_reserve) = if token_is_a {
                (self.quantity_token_b, self.quantity_token_a)
            } else {
                (self.quantity_token_a, self.quantity_token_b)
            };
            let output_amount = -amount;
            let input_amount =
                self.compute_inverse_swap_value(output_amount, input_reserve, output_reserve)?;
            let new_input = input_reserve + input_amount;
            let new_output = output_reserve - output_amount;
            if token_is_a {
                self.update_pool_quantities(new_output, new_input)?;
            } else {
                self.update_pool_quantities(new_input, new_output)?;
            }
            input_amount
        } else {
            return Ok((other_token, 0.0));
        };

        self.update_supplies(token, &other_token, amount, other_amount, ledger)?;

        Ok((other_token, other_amount))
    }

    /// Fee-adjusted output for depositing `input_quantity` against the
    /// given reserves. Read-only.
    pub fn compute_swap_value(
        &self,
        input_quantity: f64,
        input_reserve: f64,
        output_reserve: f64,
    ) -> Result<f64, AmmError> {
        let effective_input = input_quantity * (1.0 - self.fee);
        self.formula
            .apply(effective_input, input_reserve, output_reserve)
    }

    /// Fee-adjusted input required to withdraw `output_quantity`; the
    /// computed input is inflated by `1/(1-fee)` so the fee is collected
    /// on the side actually being deposited. Read-only.
    pub fn compute_inverse_swap_value(
        &self,
        output_quantity: f64,
        input_reserve: f64,
        output_reserve: f64,
    ) -> Result<f64, AmmError> {
        let input_amount =
            self.formula
                .inverse_apply(output_quantity, input_reserve, output_reserve)?;
        Ok(input_amount / (1.0 - self.fee))
    }

    fn update_pool_quantities(
        &mut self,
        new_quantity_token_a: f64,
        new_quantity_token_b: f64,
    ) -> Result<(), AmmError> {
        if new_quantity_token_a < 0.0 || new_quantity_token_b < 0.0 {
            return Err(AmmError::NegativeReserve {
                quantity_token_a: new_quantity_token_a,
                quantity_token_b: new_quantity_token_b,
            });
        }
        self.quantity_token_a = new_quantity_token_a;
        self.quantity_token_b = new_quantity_token_b;
        Ok(())
    }

    /// Overwrites both reserves with an externally derived view; callers
    /// are responsible for consistency with the formula invariant.
    pub(crate) fn set_reserves(&mut self, quantity_token_a: f64, quantity_token_b: f64) {
        self.quantity_token_a = quantity_token_a;
        self.quantity_token_b = quantity_token_b;
    }

    fn update_supplies(
        &self,
        token: &Token,
        other_token: &Token,
        amount: f64,
        other_amount: f64,
        ledger: SupplyLedger,
    ) -> Result<(), AmmError> {
        match ledger {
            SupplyLedger::Circulating => {
                token.adjust_free_supply(-amount)?;
                other_token.adjust_free_supply(other_amount * amount.signum())?;
            }
            SupplyLedger::MintBurn => {
                if amount > 0.0 {
                    token.burn(amount)?;
                    other_token.mint(other_amount)?;
                } else {
                    token.mint(-amount)?;
                    other_token.burn(other_amount)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for LiquidityPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiquidityPool")
            .field("token_a", &self.token_a.name())
            .field("token_b", &self.token_b.name())
            .field("quantity_token_a", &self.quantity_token_a)
            .field("quantity_token_b", &self.quantity_token_b)
            .field("fee", &self.fee)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::ConstantProductFormula;

    fn tokens() -> (Token, Token) {
        let asset = Token::collateral("CT", 1_000_000.0, 500_000.0, 1.0).unwrap();
        let reference = Token::reference("USD");
        (asset, reference)
    }

    fn pool(fee: f64) -> (LiquidityPool, Token, Token) {
        let (asset, reference) = tokens();
        let pool = LiquidityPool::new(
            asset.clone(),
            reference.clone(),
            5000.0,
            5000.0,
            fee,
            Arc::new(ConstantProductFormula),
        )
        .unwrap();
        (pool, asset, reference)
    }

    #[test]
    fn construction_validates_inputs() {
        let (asset, reference) = tokens();
        let formula: Arc<dyn SwapFormula> = Arc::new(ConstantProductFormula);
        assert!(matches!(
            LiquidityPool::new(
                asset.clone(),
                asset.clone(),
                1.0,
                1.0,
                0.0,
                Arc::clone(&formula)
            ),
            Err(AmmError::IdenticalTokens)
        ));
        assert!(matches!(
            LiquidityPool::new(
                asset.clone(),
                reference.clone(),
                0.0,
                1.0,
                0.0,
                Arc::clone(&formula)
            ),
            Err(AmmError::NonPositiveQuantity { .. })
        ));
        assert!(matches!(
            LiquidityPool::new(asset, reference, 1.0, 1.0, 1.0, formula),
            Err(AmmError::FeeOutOfRange { .. })
        ));
    }

    #[test]
    fn forward_swap_moves_reserves_and_supplies() {
        let (mut pool, asset, reference) = pool(0.0);
        let free_before = asset.free_supply();

        let (out_token, out_amount) = pool.swap(&asset, 100.0).unwrap();
        assert!(out_token.same_token(&reference));
        assert!((out_amount - 98.03921568627452).abs() < 1e-9);
        assert!((pool.quantity_token_a() - 5100.0).abs() < 1e-9);
        assert!((pool.quantity_token_b() - 4901.960784313725).abs() < 1e-6);
        // Deposited tokens left circulation.
        assert!((asset.free_supply() - (free_before - 100.0)).abs() < 1e-9);
    }

    #[test]
    fn reverse_swap_charges_the_deposited_side() {
        let (mut pool, asset, _reference) = pool(0.003);
        // Withdraw exactly 100 of the asset; the reference deposit is the
        // formula input inflated by 1/(1-fee).
        let (_, deposit) = pool.swap(&asset, -100.0).unwrap();
        let raw = ConstantProductFormula
            .inverse_apply(100.0, 5000.0, 5000.0)
            .unwrap();
        assert!((deposit - raw / (1.0 - 0.003)).abs() < 1e-9);
        assert!((pool.quantity_token_a() - 4900.0).abs() < 1e-9);
        assert!((pool.quantity_token_b() - (5000.0 + deposit)).abs() < 1e-9);
    }

    #[test]
    fn zero_amount_is_a_no_op() {
        let (mut pool, asset, reference) = pool(0.003);
        let free_before = asset.free_supply();
        let (out_token, out_amount) = pool.swap(&asset, 0.0).unwrap();
        assert!(out_token.same_token(&reference));
        assert_eq!(out_amount, 0.0);
        assert_eq!(pool.quantity_token_a(), 5000.0);
        assert_eq!(pool.quantity_token_b(), 5000.0);
        assert_eq!(asset.free_supply(), free_before);
    }

    #[test]
    fn swap_rejects_foreign_tokens() {
        let (mut pool, _, _) = pool(0.0);
        let stranger = Token::collateral("XX", 10.0, 5.0, 1.0).unwrap();
        assert!(matches!(
            pool.swap(&stranger, 10.0),
            Err(AmmError::UnknownToken { .. })
        ));
    }

    #[test]
    fn constant_product_is_invariant_without_fee() {
        let (mut pool, asset, reference) = pool(0.0);
        let k0 = pool.quantity_token_a() * pool.quantity_token_b();
        pool.swap(&asset, 250.0).unwrap();
        pool.swap(&reference, 40.0).unwrap();
        pool.swap(&asset, -90.0).unwrap();
        let k1 = pool.quantity_token_a() * pool.quantity_token_b();
        assert!((k1 - k0).abs() <= 1e-6 * k0);
    }

    #[test]
    fn fee_makes_constant_product_grow() {
        let (mut pool, asset, reference) = pool(0.003);
        let mut k = pool.quantity_token_a() * pool.quantity_token_b();
        for amount in [250.0, 40.0, 90.0] {
            pool.swap(&asset, amount).unwrap();
            let k_next = pool.quantity_token_a() * pool.quantity_token_b();
            assert!(k_next > k);
            k = k_next;
            pool.swap(&reference, amount).unwrap();
            let k_next = pool.quantity_token_a() * pool.quantity_token_b();
            assert!(k_next > k);
            k = k_next;
        }
    }

    #[test]
    fn reverse_swap_cannot_drain_a_reserve() {
        let (mut pool, asset, _) = pool(0.0);
        assert!(matches!(
            pool.swap(&asset, -5000.0),
            Err(AmmError::OutputExceedsReserve { .. })
        ));
    }

    #[test]
    fn implied_price_tracks_reserve_ratio() {
        let (mut pool, asset, _) = pool(0.0);
        assert!((pool.implied_price_token_a() - 1.0).abs() < 1e-12);
        pool.swap(&asset, 1000.0).unwrap();
        assert!(pool.implied_price_token_a() < 1.0);
    }
}
