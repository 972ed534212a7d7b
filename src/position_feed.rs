// Market Position Integration
//
// The perpetual market reports the pool's market-making exposure as a
// position snapshot: unrealized pnl plus the outstanding base size. Markets
// differ in what their pnl is denominated in, so the adapter normalizes
// everything to quote precision before the NAV engine sees it.

use crate::math::{self, MathError, BASE_TO_QUOTE_PRECISION_RATIO, PRICE_PRECISION};
use crate::price_feed::FeedError;
use crate::types::{MarketId, Price, SignedQuote};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// What the market's pnl field is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PnlDenomination {
    /// Already in quote precision; passes through untouched.
    Quote,
    /// In base precision; valued at the oracle price.
    Base,
}

/// Read-time snapshot of the pool's position in its bound market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPositionSnapshot {
    pub market_id: MarketId,
    /// unrealized pnl in `denomination` units, signed
    pub unrealized_pnl: i128,
    /// outstanding base exposure, signed (long positive), base precision
    pub base_asset_amount: i128,
    pub denomination: PnlDenomination,
}

/// Read-only snapshot source for market positions.
pub trait MarketPositionProvider: Send + Sync {
    fn market_position(&self, market_id: MarketId) -> Result<MarketPositionSnapshot, FeedError>;
}

// 5.1: normalize the market's reported pnl to quote precision. base pnl is
// valued at the oracle price: quote = base * price / PRICE_PRECISION, then
// scaled down from base to quote precision. truncates toward zero.
pub fn attributed_pnl(
    snapshot: &MarketPositionSnapshot,
    oracle_price: Price,
) -> Result<SignedQuote, MathError> {
    match snapshot.denomination {
        PnlDenomination::Quote => Ok(SignedQuote::new(snapshot.unrealized_pnl)),
        PnlDenomination::Base => {
            let valued = math::mul_div_signed(
                snapshot.unrealized_pnl,
                oracle_price.raw() as u128,
                PRICE_PRECISION as u128,
            )?;
            let quote = valued
                .checked_div(BASE_TO_QUOTE_PRECISION_RATIO as i128)
                .ok_or(MathError::DivisionByZero)?;
            Ok(SignedQuote::new(quote))
        }
    }
}

/// In-memory market for tests and the simulator.
#[derive(Debug, Default)]
pub struct MockMarket {
    positions: Mutex<HashMap<MarketId, MarketPositionSnapshot>>,
    failure: Mutex<Option<FeedError>>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a market with a flat position. Also makes the market known
    /// for initialization checks.
    pub fn add_market(&self, market_id: MarketId) {
        self.set_position(MarketPositionSnapshot {
            market_id,
            unrealized_pnl: 0,
            base_asset_amount: 0,
            denomination: PnlDenomination::Quote,
        });
    }

    pub fn set_position(&self, snapshot: MarketPositionSnapshot) {
        self.positions
            .lock()
            .expect("mock market poisoned")
            .insert(snapshot.market_id, snapshot);
    }

    /// Shorthand for steering the pool's quote-denominated pnl in tests.
    pub fn set_quote_pnl(&self, market_id: MarketId, unrealized_pnl: i128) {
        self.set_position(MarketPositionSnapshot {
            market_id,
            unrealized_pnl,
            base_asset_amount: 0,
            denomination: PnlDenomination::Quote,
        });
    }

    pub fn set_failure(&self, failure: Option<FeedError>) {
        *self.failure.lock().expect("mock market poisoned") = failure;
    }
}

impl MarketPositionProvider for MockMarket {
    fn market_position(&self, market_id: MarketId) -> Result<MarketPositionSnapshot, FeedError> {
        if let Some(err) = self.failure.lock().expect("mock market poisoned").clone() {
            return Err(err);
        }
        self.positions
            .lock()
            .expect("mock market poisoned")
            .get(&market_id)
            .copied()
            .ok_or(FeedError::UnknownMarket(market_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{BASE_PRECISION, QUOTE_PRECISION};

    fn base_snapshot(pnl: i128) -> MarketPositionSnapshot {
        MarketPositionSnapshot {
            market_id: MarketId(1),
            unrealized_pnl: pnl,
            base_asset_amount: BASE_PRECISION as i128,
            denomination: PnlDenomination::Base,
        }
    }

    #[test]
    fn quote_pnl_passes_through() {
        let snap = MarketPositionSnapshot {
            market_id: MarketId(1),
            unrealized_pnl: -42_000_000,
            base_asset_amount: 0,
            denomination: PnlDenomination::Quote,
        };
        let price = Price::new_unchecked(PRICE_PRECISION);
        assert_eq!(attributed_pnl(&snap, price).unwrap().raw(), -42_000_000);
    }

    #[test]
    fn base_pnl_valued_at_oracle_price() {
        // 2.0 base units of pnl at $50/base = $100 = 100_000_000 quote raw
        let snap = base_snapshot(2 * BASE_PRECISION as i128);
        let price = Price::new_unchecked(50 * PRICE_PRECISION);
        assert_eq!(
            attributed_pnl(&snap, price).unwrap().raw(),
            100 * QUOTE_PRECISION as i128
        );
    }

    #[test]
    fn negative_base_pnl_keeps_sign() {
        let snap = base_snapshot(-(BASE_PRECISION as i128) / 2);
        let price = Price::new_unchecked(10 * PRICE_PRECISION);
        // -0.5 base at $10 = -$5
        assert_eq!(
            attributed_pnl(&snap, price).unwrap().raw(),
            -5 * QUOTE_PRECISION as i128
        );
    }

    #[test]
    fn mock_market_lookup() {
        let market = MockMarket::new();
        market.add_market(MarketId(3));

        assert!(market.market_position(MarketId(3)).is_ok());
        assert_eq!(
            market.market_position(MarketId(4)),
            Err(FeedError::UnknownMarket(MarketId(4)))
        );
    }
}
