// Oracle Price Integration
//
// The ledger is agnostic to where prices come from. Pyth, Chainlink, a CEX
// aggregator: anything that can produce a timestamped price implements
// OracleProvider. The ledger treats a provider call as a fast, bounded
// lookup; a provider backed by a remote source must enforce its own timeout
// and report it as FeedError::Timeout rather than block the caller.

use crate::types::{MarketId, Price, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// A single oracle observation for one market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OraclePrice {
    pub price: Price,
    pub timestamp: Timestamp,
}

impl OraclePrice {
    pub fn new(price: Price, timestamp: Timestamp) -> Self {
        Self { price, timestamp }
    }
}

/// Errors a feed can report. Timeout is the only class callers may retry,
/// and only with their own retry budget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("upstream feed timed out for market {0:?}")]
    Timeout(MarketId),

    #[error("upstream feed unavailable for market {0:?}")]
    Unavailable(MarketId),

    #[error("unknown market {0:?}")]
    UnknownMarket(MarketId),
}

/// Read-only snapshot source for oracle prices.
pub trait OracleProvider: Send + Sync {
    fn price(&self, market_id: MarketId) -> Result<OraclePrice, FeedError>;
}

/// In-memory oracle for tests and the simulator. Interior mutability so a
/// shared handle can be steered while the ledger holds another.
#[derive(Debug, Default)]
pub struct MockOracle {
    prices: Mutex<HashMap<MarketId, OraclePrice>>,
    failure: Mutex<Option<FeedError>>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, market_id: MarketId, price: Price, timestamp: Timestamp) {
        self.prices
            .lock()
            .expect("mock oracle poisoned")
            .insert(market_id, OraclePrice::new(price, timestamp));
    }

    /// Every subsequent read fails with `failure` until cleared with None.
    pub fn set_failure(&self, failure: Option<FeedError>) {
        *self.failure.lock().expect("mock oracle poisoned") = failure;
    }
}

impl OracleProvider for MockOracle {
    fn price(&self, market_id: MarketId) -> Result<OraclePrice, FeedError> {
        if let Some(err) = self.failure.lock().expect("mock oracle poisoned").clone() {
            return Err(err);
        }
        self.prices
            .lock()
            .expect("mock oracle poisoned")
            .get(&market_id)
            .copied()
            .ok_or(FeedError::UnknownMarket(market_id))
    }
}
