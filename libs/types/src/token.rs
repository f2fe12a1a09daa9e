//! Token model: priced assets with supply bookkeeping.
//!
//! A token tracks three pieces of market state: its reference price, its
//! total supply, and its free supply (the amount circulating in user
//! wallets rather than locked in pools). Pools move free supply on every
//! swap; seignorage-style mint/burn moves total supply. The invariant
//! `0 <= free_supply <= supply` holds at all times.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Float residue below this magnitude snaps to exactly zero when updating
/// free supply, so long swap sequences cannot drift a balance to -1e-12
/// and trip the non-negativity check.
const FREE_SUPPLY_SNAP: f64 = 1e-3;

/// Errors raised by token construction and mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("token price must be positive, got {value}")]
    NonPositivePrice { value: f64 },

    #[error("token supply must be positive, got {value}")]
    NonPositiveSupply { value: f64 },

    #[error("free supply must be non-negative, got {value}")]
    NegativeFreeSupply { value: f64 },

    #[error("free supply {free_supply} cannot exceed total supply {supply}")]
    FreeSupplyExceedsSupply { free_supply: f64, supply: f64 },

    #[error("the price of reference token '{name}' is fixed at 1.0")]
    FixedReferencePrice { name: String },

    #[error("reference token '{name}' has unbounded supply and cannot be minted or burned")]
    ReferenceSupplyImmutable { name: String },

    #[error("amount to mint must be positive, got {value}")]
    NonPositiveMint { value: f64 },

    #[error("amount to burn must be positive, got {value}")]
    NonPositiveBurn { value: f64 },

    #[error("cannot burn {amount}: current supply is {supply}")]
    BurnExceedsSupply { amount: f64, supply: f64 },

    #[error("reducing supply to {supply} would drive free supply negative")]
    SupplyUnderflow { supply: f64 },
}

/// What a token is in the seignorage model. Chosen at construction,
/// never changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenRole {
    /// Pegged token whose supply expands and contracts to defend `peg`.
    AlgorithmicStablecoin { peg: f64 },
    /// Free-floating token absorbing the stablecoin's volatility.
    Collateral,
    /// Numéraire with a fixed price of 1.0 and unbounded supply.
    Reference,
}

#[derive(Debug)]
struct TokenState {
    name: String,
    supply: f64,
    free_supply: f64,
    price: f64,
    role: TokenRole,
}

/// Shared handle to a token. Cloning the handle does not copy the token;
/// all clones observe and apply the same mutations.
#[derive(Clone)]
pub struct Token {
    inner: Arc<RwLock<TokenState>>,
}

impl Token {
    /// Creates an algorithmic stablecoin pegged to `peg`.
    pub fn algorithmic_stablecoin(
        name: impl Into<String>,
        initial_supply: f64,
        initial_free_supply: f64,
        initial_price: f64,
        peg: f64,
    ) -> Result<Self, TokenError> {
        if peg <= 0.0 {
            return Err(TokenError::NonPositivePrice { value: peg });
        }
        Self::with_role(
            name,
            initial_supply,
            initial_free_supply,
            initial_price,
            TokenRole::AlgorithmicStablecoin { peg },
        )
    }

    /// Creates a free-floating collateral token.
    pub fn collateral(
        name: impl Into<String>,
        initial_supply: f64,
        initial_free_supply: f64,
        initial_price: f64,
    ) -> Result<Self, TokenError> {
        Self::with_role(
            name,
            initial_supply,
            initial_free_supply,
            initial_price,
            TokenRole::Collateral,
        )
    }

    /// Creates the reference numéraire: price pinned to 1.0, supply
    /// unbounded so pool bookkeeping never constrains it.
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TokenState {
                name: name.into(),
                supply: f64::INFINITY,
                free_supply: f64::INFINITY,
                price: 1.0,
                role: TokenRole::Reference,
            })),
        }
    }

    fn with_role(
        name: impl Into<String>,
        initial_supply: f64,
        initial_free_supply: f64,
        initial_price: f64,
        role: TokenRole,
    ) -> Result<Self, TokenError> {
        if initial_supply <= 0.0 {
            return Err(TokenError::NonPositiveSupply {
                value: initial_supply,
            });
        }
        if initial_free_supply < 0.0 {
            return Err(TokenError::NegativeFreeSupply {
                value: initial_free_supply,
            });
        }
        if initial_free_supply > initial_supply {
            return Err(TokenError::FreeSupplyExceedsSupply {
                free_supply: initial_free_supply,
                supply: initial_supply,
            });
        }
        if initial_price <= 0.0 {
            return Err(TokenError::NonPositivePrice {
                value: initial_price,
            });
        }
        Ok(Self {
            inner: Arc::new(RwLock::new(TokenState {
                name: name.into(),
                supply: initial_supply,
                free_supply: initial_free_supply,
                price: initial_price,
                role,
            })),
        })
    }

    /// True when both handles refer to the same token allocation.
    pub fn same_token(&self, other: &Token) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn name(&self) -> String {
        self.inner.read().name.clone()
    }

    pub fn role(&self) -> TokenRole {
        self.inner.read().role
    }

    /// The peg target, when this token is an algorithmic stablecoin.
    pub fn peg(&self) -> Option<f64> {
        match self.inner.read().role {
            TokenRole::AlgorithmicStablecoin { peg } => Some(peg),
            _ => None,
        }
    }

    pub fn price(&self) -> f64 {
        self.inner.read().price
    }

    pub fn supply(&self) -> f64 {
        self.inner.read().supply
    }

    pub fn free_supply(&self) -> f64 {
        self.inner.read().free_supply
    }

    /// Updates the reference price. The reference token's price is fixed.
    pub fn set_price(&self, new_price: f64) -> Result<(), TokenError> {
        let mut state = self.inner.write();
        if matches!(state.role, TokenRole::Reference) {
            return Err(TokenError::FixedReferencePrice {
                name: state.name.clone(),
            });
        }
        if new_price <= 0.0 {
            return Err(TokenError::NonPositivePrice { value: new_price });
        }
        state.price = new_price;
        Ok(())
    }

    /// Replaces the free supply, snapping tiny float residue to zero.
    pub fn set_free_supply(&self, new_free_supply: f64) -> Result<(), TokenError> {
        let mut state = self.inner.write();
        let snapped = snap_residue(new_free_supply);
        if snapped < 0.0 {
            return Err(TokenError::NegativeFreeSupply { value: snapped });
        }
        if snapped > state.supply {
            return Err(TokenError::FreeSupplyExceedsSupply {
                free_supply: snapped,
                supply: state.supply,
            });
        }
        state.free_supply = snapped;
        Ok(())
    }

    /// Shifts the free supply by a signed amount. Positive means tokens
    /// entering circulation (leaving a pool), negative the opposite.
    pub fn adjust_free_supply(&self, variation: f64) -> Result<(), TokenError> {
        let current = self.inner.read().free_supply;
        self.set_free_supply(current + variation)
    }

    /// Expands the supply; free supply moves by the same amount so pool
    /// holdings are unaffected.
    pub fn mint(&self, amount: f64) -> Result<(), TokenError> {
        if amount <= 0.0 {
            return Err(TokenError::NonPositiveMint { value: amount });
        }
        let supply = {
            let state = self.inner.read();
            if matches!(state.role, TokenRole::Reference) {
                return Err(TokenError::ReferenceSupplyImmutable {
                    name: state.name.clone(),
                });
            }
            state.supply
        };
        self.set_supply(supply + amount)
    }

    /// Contracts the supply; the burned amount is removed from circulation.
    pub fn burn(&self, amount: f64) -> Result<(), TokenError> {
        if amount <= 0.0 {
            return Err(TokenError::NonPositiveBurn { value: amount });
        }
        let supply = {
            let state = self.inner.read();
            if matches!(state.role, TokenRole::Reference) {
                return Err(TokenError::ReferenceSupplyImmutable {
                    name: state.name.clone(),
                });
            }
            state.supply
        };
        if amount > supply {
            return Err(TokenError::BurnExceedsSupply { amount, supply });
        }
        self.set_supply(supply - amount)
    }

    /// Replaces the total supply, moving free supply by the same
    /// difference so that pooled balances stay untouched.
    pub fn set_supply(&self, new_supply: f64) -> Result<(), TokenError> {
        let mut state = self.inner.write();
        if new_supply < 0.0 {
            return Err(TokenError::NonPositiveSupply { value: new_supply });
        }
        let new_free_supply = snap_residue(state.free_supply + (new_supply - state.supply));
        if new_free_supply < 0.0 {
            return Err(TokenError::SupplyUnderflow { supply: new_supply });
        }
        state.free_supply = new_free_supply;
        state.supply = new_supply;
        Ok(())
    }
}

fn snap_residue(value: f64) -> f64 {
    if value != 0.0 && value.abs() < FREE_SUPPLY_SNAP {
        0.0
    } else {
        value
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.read();
        f.debug_struct("Token")
            .field("name", &state.name)
            .field("role", &state.role)
            .field("price", &state.price)
            .field("supply", &state.supply)
            .field("free_supply", &state.free_supply)
            .finish()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.read();
        match state.role {
            TokenRole::AlgorithmicStablecoin { peg } => write!(
                f,
                "AlgorithmicStablecoin(name={}, price={}, supply={}, peg={})",
                state.name, state.price, state.supply, peg
            ),
            TokenRole::Collateral => write!(
                f,
                "CollateralToken(name={}, price={}, supply={})",
                state.name, state.price, state.supply
            ),
            TokenRole::Reference => {
                write!(f, "ReferenceToken(name={}, price={})", state.name, state.price)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stablecoin() -> Token {
        Token::algorithmic_stablecoin("AS", 1_000_000.0, 800_000.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn construction_validates_invariants() {
        assert!(matches!(
            Token::collateral("CT", -5.0, 0.0, 1.0),
            Err(TokenError::NonPositiveSupply { .. })
        ));
        assert!(matches!(
            Token::collateral("CT", 100.0, 200.0, 1.0),
            Err(TokenError::FreeSupplyExceedsSupply { .. })
        ));
        assert!(matches!(
            Token::collateral("CT", 100.0, 50.0, 0.0),
            Err(TokenError::NonPositivePrice { .. })
        ));
        assert!(matches!(
            Token::algorithmic_stablecoin("AS", 100.0, 50.0, 1.0, -1.0),
            Err(TokenError::NonPositivePrice { .. })
        ));
    }

    #[test]
    fn identity_is_by_handle() {
        let a = stablecoin();
        let b = a.clone();
        let c = stablecoin();
        assert!(a.same_token(&b));
        assert!(!a.same_token(&c));
    }

    #[test]
    fn clones_observe_mutation() {
        let a = stablecoin();
        let b = a.clone();
        a.set_price(1.25).unwrap();
        assert_eq!(b.price(), 1.25);
    }

    #[test]
    fn mint_moves_supply_and_free_supply_together() {
        let token = stablecoin();
        token.mint(1000.0).unwrap();
        assert_eq!(token.supply(), 1_001_000.0);
        assert_eq!(token.free_supply(), 801_000.0);
    }

    #[test]
    fn burn_is_bounded_by_supply() {
        let token = stablecoin();
        token.burn(500_000.0).unwrap();
        assert_eq!(token.supply(), 500_000.0);
        assert_eq!(token.free_supply(), 300_000.0);
        assert!(matches!(
            token.burn(2_000_000.0),
            Err(TokenError::BurnExceedsSupply { .. })
        ));
        assert!(matches!(
            token.burn(0.0),
            Err(TokenError::NonPositiveBurn { .. })
        ));
    }

    #[test]
    fn burn_cannot_drive_free_supply_negative() {
        // 100 circulating out of 1000; burning 200 from circulation
        // would leave free supply at -100.
        let token = Token::collateral("CT", 1000.0, 100.0, 2.0).unwrap();
        assert!(matches!(
            token.burn(200.0),
            Err(TokenError::SupplyUnderflow { .. })
        ));
    }

    #[test]
    fn free_supply_is_bounded() {
        let token = Token::collateral("CT", 1000.0, 100.0, 2.0).unwrap();
        assert!(matches!(
            token.set_free_supply(1500.0),
            Err(TokenError::FreeSupplyExceedsSupply { .. })
        ));
        assert!(matches!(
            token.adjust_free_supply(-200.0),
            Err(TokenError::NegativeFreeSupply { .. })
        ));
        token.adjust_free_supply(-100.0).unwrap();
        assert_eq!(token.free_supply(), 0.0);
    }

    #[test]
    fn tiny_negative_residue_snaps_to_zero() {
        let token = Token::collateral("CT", 1000.0, 100.0, 2.0).unwrap();
        token.adjust_free_supply(-100.0 - 1e-9).unwrap();
        assert_eq!(token.free_supply(), 0.0);
    }

    #[test]
    fn reference_token_is_pinned() {
        let usd = Token::reference("USD");
        assert_eq!(usd.price(), 1.0);
        assert!(usd.supply().is_infinite());
        assert!(matches!(
            usd.set_price(1.1),
            Err(TokenError::FixedReferencePrice { .. })
        ));
        assert!(matches!(
            usd.mint(10.0),
            Err(TokenError::ReferenceSupplyImmutable { .. })
        ));
        assert!(matches!(
            usd.burn(10.0),
            Err(TokenError::ReferenceSupplyImmutable { .. })
        ));
        // Free-supply bookkeeping on an unbounded token is a no-op in
        // effect: infinity absorbs any finite flow.
        usd.adjust_free_supply(-1234.5).unwrap();
        assert!(usd.free_supply().is_infinite());
    }

    #[test]
    fn peg_only_on_stablecoin() {
        assert_eq!(stablecoin().peg(), Some(1.0));
        assert_eq!(Token::reference("USD").peg(), None);
        assert_eq!(Token::collateral("CT", 1.0, 0.5, 2.0).unwrap().peg(), None);
    }
}
