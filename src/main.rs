//! LP Pool Ledger Simulation.
//!
//! Demonstrates the pool lifecycle end to end: bootstrap funding,
//! NAV-proportional minting as pnl moves, partial liquidity, insolvency and
//! recapitalization, administrative pause/close, and concurrent settlement.

use lp_pool_core::*;
use std::sync::Arc;

const MARKET: MarketId = MarketId(1);

fn usd(units: u64) -> Quote {
    Quote::new(units * QUOTE_PRECISION)
}

fn setup() -> (Arc<PoolLedger>, Arc<MockOracle>, Arc<MockMarket>) {
    let oracle = Arc::new(MockOracle::new());
    let market = Arc::new(MockMarket::new());
    market.add_market(MARKET);
    oracle.set_price(
        MARKET,
        Price::new_unchecked(150 * PRICE_PRECISION),
        Timestamp::from_millis(0),
    );
    let ledger = PoolLedger::new(LedgerConfig::default(), oracle.clone(), market.clone());
    (Arc::new(ledger), oracle, market)
}

fn main() {
    println!("LP Pool Ledger Simulation");
    println!("Single Market, NAV-Consistent Shares, Full Lifecycle\n");

    scenario_1_bootstrap_and_proportional_funding();
    scenario_2_pnl_moves_nav();
    scenario_3_partial_liquidity();
    scenario_4_insolvency_and_recapitalization();
    scenario_5_lifecycle();
    scenario_6_concurrent_settlement();

    println!("\nAll simulations completed successfully.");
}

/// First deposit mints at the bootstrap price, later deposits proportionally.
fn scenario_1_bootstrap_and_proportional_funding() {
    println!("Scenario 1: Bootstrap and Proportional Funding\n");

    let (ledger, _oracle, _market) = setup();
    let now = Timestamp::from_millis(0);
    let pool = ledger
        .initialize(PoolParams::new(MARKET, "SOL-PERP LP"), now)
        .unwrap();

    let alice = DepositorId(1);
    let bob = DepositorId(2);

    let receipt = ledger.fund(pool, alice, usd(1_000_000), now).unwrap();
    println!("  Alice funds $1,000,000 -> {} shares @ {}", receipt.shares_minted, receipt.nav_per_share);

    let receipt = ledger.fund(pool, bob, usd(500_000), now).unwrap();
    println!("  Bob funds $500,000 -> {} shares @ {}", receipt.shares_minted, receipt.nav_per_share);

    let nav = ledger.get_nav(pool, now).unwrap();
    println!("  Pool NAV: {} over {} shares\n", nav.nav, nav.total_shares);
}

/// Unrealized pnl reprices the shares of later depositors.
fn scenario_2_pnl_moves_nav() {
    println!("Scenario 2: PnL Moves NAV\n");

    let (ledger, _oracle, market) = setup();
    let now = Timestamp::from_millis(0);
    let pool = ledger
        .initialize(PoolParams::new(MARKET, "SOL-PERP LP"), now)
        .unwrap();

    ledger.fund(pool, DepositorId(1), usd(1_000_000), now).unwrap();

    // market making earned $100,000 unrealized
    market.set_quote_pnl(MARKET, 100_000 * QUOTE_PRECISION as i128);
    let nav = ledger.get_nav(pool, now).unwrap();
    println!("  After +$100,000 pnl, NAV: {}", nav.nav);

    let receipt = ledger.fund(pool, DepositorId(2), usd(110_000), now).unwrap();
    println!(
        "  Charlie funds $110,000 -> {} shares (premium NAV, fewer shares)\n",
        receipt.shares_minted
    );
}

/// Proportional NAV can exceed what the vault holds when pnl is unrealized.
fn scenario_3_partial_liquidity() {
    println!("Scenario 3: Partial Liquidity\n");

    let (ledger, _oracle, market) = setup();
    let now = Timestamp::from_millis(0);
    let pool = ledger
        .initialize(PoolParams::new(MARKET, "SOL-PERP LP"), now)
        .unwrap();

    let alice = DepositorId(1);
    let receipt = ledger.fund(pool, alice, usd(1_000_000), now).unwrap();
    let all_shares = receipt.shares_minted;

    market.set_quote_pnl(MARKET, 200_000 * QUOTE_PRECISION as i128);

    match ledger.withdraw(pool, alice, all_shares, now) {
        Err(err) => println!("  Full exit rejected while pnl is unrealized: {err}"),
        Ok(_) => unreachable!("vault cannot cover unrealized pnl"),
    }

    // the market settles its pnl into the vault; now the exit clears
    market.set_quote_pnl(MARKET, 0);
    ledger
        .settle_pnl(pool, SignedQuote::new(200_000 * QUOTE_PRECISION as i128), now)
        .unwrap();
    let receipt = ledger.withdraw(pool, alice, all_shares, now).unwrap();
    println!("  After settlement, full exit pays {}\n", receipt.amount);
}

/// Losses past the vault block withdrawals until someone recapitalizes.
fn scenario_4_insolvency_and_recapitalization() {
    println!("Scenario 4: Insolvency and Recapitalization\n");

    let (ledger, _oracle, market) = setup();
    let now = Timestamp::from_millis(0);
    let pool = ledger
        .initialize(PoolParams::new(MARKET, "SOL-PERP LP"), now)
        .unwrap();

    let alice = DepositorId(1);
    ledger.fund(pool, alice, usd(500), now).unwrap();
    market.set_quote_pnl(MARKET, -(600 * QUOTE_PRECISION as i128));

    let nav = ledger.get_nav(pool, now).unwrap();
    println!("  Collateral $500, pnl -$600, NAV: {}", nav.nav);

    match ledger.withdraw(pool, alice, Shares::new(1), now) {
        Err(err) => println!("  Withdrawal blocked: {err}"),
        Ok(_) => unreachable!("insolvent pool cannot pay out"),
    }

    // a recapitalizing deposit mints at the bootstrap price
    let receipt = ledger.fund(pool, DepositorId(2), usd(1_000), now).unwrap();
    println!(
        "  Recapitalized with $1,000 -> {} shares at bootstrap price",
        receipt.shares_minted
    );
    let nav = ledger.get_nav(pool, now).unwrap();
    println!("  NAV after recapitalization: {}\n", nav.nav);
}

/// Pause gates funding, close requires an empty pool and reports dust.
fn scenario_5_lifecycle() {
    println!("Scenario 5: Lifecycle\n");

    let (ledger, _oracle, market) = setup();
    let now = Timestamp::from_millis(0);
    let pool = ledger
        .initialize(PoolParams::new(MARKET, "SOL-PERP LP"), now)
        .unwrap();

    let alice = DepositorId(1);
    let receipt = ledger.fund(pool, alice, usd(10_000), now).unwrap();

    ledger.pause(pool, now).unwrap();
    match ledger.fund(pool, alice, usd(1), now) {
        Err(err) => println!("  Funding while paused: {err}"),
        Ok(_) => unreachable!("paused pool accepts no funding"),
    }
    ledger.resume(pool, now).unwrap();

    // a small loss strands dust on the full exit
    market.set_quote_pnl(MARKET, -(QUOTE_PRECISION as i128));
    let exit = ledger.withdraw(pool, alice, receipt.shares_minted, now).unwrap();
    println!("  Full exit pays {} against $10,000 funded", exit.amount);

    ledger.close(pool, now).unwrap();
    let state = ledger.pool_snapshot(pool).unwrap();
    println!(
        "  Pool closed; residual dust collateral: {}\n",
        state.vault.collateral()
    );
}

/// Settlements on one pool serialize; no shares are lost or double minted.
fn scenario_6_concurrent_settlement() {
    println!("Scenario 6: Concurrent Settlement\n");

    let (ledger, _oracle, _market) = setup();
    let now = Timestamp::from_millis(0);
    let pool = ledger
        .initialize(PoolParams::new(MARKET, "SOL-PERP LP"), now)
        .unwrap();

    let mut handles = Vec::new();
    for i in 1..=8u64 {
        let ledger = ledger.clone();
        handles.push(std::thread::spawn(move || {
            ledger
                .fund(pool, DepositorId(i), usd(1_000_000), now)
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let state = ledger.pool_snapshot(pool).unwrap();
    println!(
        "  8 threads funded $1,000,000 each -> total shares {}, conserved: {}",
        state.vault.total_shares(),
        state.vault.shares_conserved()
    );
}
