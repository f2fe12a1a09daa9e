//! End-to-end scenarios across the whole three-pool economy.

use arbitrage_strategy::{
    ArbitrageKind, ArbitrageOptimizer, OptimizerConfig, ThreePoolsArbitrageOptimizer,
};
use pegsim_e2e_tests::MarketFixture;

fn optimizer(fixture: &MarketFixture) -> ThreePoolsArbitrageOptimizer {
    ThreePoolsArbitrageOptimizer::new(
        fixture.stablecoin_pool.clone(),
        fixture.collateral_pool.clone(),
        fixture.virtual_pool.clone(),
        OptimizerConfig::default(),
    )
    .unwrap()
}

#[test]
fn fee_free_swap_worked_example() {
    let fixture = MarketFixture::balanced();
    let mut pool = fixture.stablecoin_pool.write();

    let (out_token, out_amount) = pool.swap(&fixture.stablecoin, 100.0).unwrap();
    assert!(out_token.same_token(&fixture.reference));
    assert!((out_amount - 98.0392156862745).abs() < 1e-9);
    assert!((pool.quantity_token_a() - 5100.0).abs() < 1e-9);
    assert!((pool.quantity_token_b() - 4901.9607843137255).abs() < 1e-9);
}

#[test]
fn balanced_market_offers_no_arbitrage() {
    let fixture = MarketFixture::balanced();
    let optimizer = optimizer(&fixture);

    for kind in [
        ArbitrageKind::StablecoinAbovePeg,
        ArbitrageKind::StablecoinBelowPeg,
    ] {
        let profit = optimizer.arbitrage_profit(kind, 1.0).unwrap();
        // Only slippage separates the probe from break-even.
        assert!(profit <= 0.0);
        assert!(profit.abs() < 0.01);
    }
    assert!(optimizer.detect_arbitrage().unwrap().is_none());
}

#[test]
fn above_peg_round_trip_closes_the_gap() {
    let fixture = MarketFixture::balanced();
    // A large reference buy pushes the stablecoin above its peg.
    fixture
        .stablecoin_pool
        .write()
        .swap(&fixture.reference, 500.0)
        .unwrap();
    fixture.mark_prices();
    assert!(fixture.stablecoin.price() > 1.0);

    let mut optimizer = optimizer(&fixture);
    assert_eq!(
        optimizer.detect_arbitrage().unwrap(),
        Some(ArbitrageKind::StablecoinAbovePeg)
    );

    let price_gap_before = (fixture.stablecoin.price() - 1.0).abs();
    let execution = optimizer.leverage_arbitrage_opportunity().unwrap().unwrap();
    assert!(execution.profit() > 0.0);

    fixture.mark_prices();
    let price_gap_after = (fixture.stablecoin.price() - 1.0).abs();
    assert!(price_gap_after < price_gap_before);

    // The virtual pool paid out stablecoin and carries the exposure.
    assert!(fixture.virtual_pool.read().delta() < 0.0);
}

#[test]
fn below_peg_round_trip_closes_the_gap() {
    let fixture = MarketFixture::balanced();
    fixture
        .stablecoin_pool
        .write()
        .swap(&fixture.stablecoin, 500.0)
        .unwrap();
    fixture.mark_prices();
    assert!(fixture.stablecoin.price() < 1.0);

    let mut optimizer = optimizer(&fixture);
    assert_eq!(
        optimizer.detect_arbitrage().unwrap(),
        Some(ArbitrageKind::StablecoinBelowPeg)
    );

    let price_gap_before = (1.0 - fixture.stablecoin.price()).abs();
    let execution = optimizer.leverage_arbitrage_opportunity().unwrap().unwrap();
    assert!(execution.profit() > 0.0);

    fixture.mark_prices();
    let price_gap_after = (1.0 - fixture.stablecoin.price()).abs();
    assert!(price_gap_after < price_gap_before);
    assert!(fixture.virtual_pool.read().delta() > 0.0);
}

#[test]
fn replenishing_unwinds_absorbed_imbalance() {
    let fixture = MarketFixture::balanced();
    // Depeg, arbitrage, then let the recovery run.
    fixture
        .stablecoin_pool
        .write()
        .swap(&fixture.stablecoin, 500.0)
        .unwrap();
    fixture.mark_prices();
    let mut optimizer = optimizer(&fixture);
    optimizer.leverage_arbitrage_opportunity().unwrap().unwrap();

    let delta_absorbed = fixture.virtual_pool.read().delta();
    assert!(delta_absorbed > 0.0);

    {
        let mut virtual_pool = fixture.virtual_pool.write();
        virtual_pool
            .update_stablecoin_price(fixture.stablecoin.price())
            .unwrap();
        virtual_pool
            .update_collateral_price(fixture.collateral.price())
            .unwrap();
        for _ in 0..10 {
            virtual_pool.perform_pool_replenishing().unwrap();
        }
    }

    // Ten exponential-decay rounds at T = 10 leave (9/10)^10 ≈ 35%.
    let remaining = fixture.virtual_pool.read().delta();
    let expected = delta_absorbed * (1.0 - 1.0 / 10.0_f64).powi(10);
    assert!((remaining - expected).abs() < 1e-9 * delta_absorbed.abs().max(1.0));
}
