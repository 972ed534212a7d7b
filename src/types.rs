// 1.0: all the primitives live here. nothing in the ledger works without these.
// IDs, scaled amounts, prices, timestamps. each is a newtype so the compiler
// catches unit mixups, and every arithmetic op is checked (see math.rs).

use crate::math::{self, MathError, PRICE_PRECISION, QUOTE_PRECISION, SHARE_PRECISION};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepositorId(pub u64);

// 1.1: millisecond timestamp. the core never reads a wall clock; callers pass
// timestamps in. now() exists for the callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    // age of `earlier` as seen from self. clamped at zero for future stamps.
    pub fn age_of(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0).max(0)
    }
}

// 1.2: quote-precision amount (6 decimals). collateral, deposits, payouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quote(u64);

impl Quote {
    pub const ZERO: Quote = Quote(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Quote) -> Result<Quote, MathError> {
        Ok(Quote(math::add_u64(self.0, other.0)?))
    }

    pub fn checked_sub(&self, other: Quote) -> Result<Quote, MathError> {
        Ok(Quote(math::sub_u64(self.0, other.0)?))
    }
}

impl From<Quote> for SignedQuote {
    fn from(q: Quote) -> Self {
        SignedQuote(q.0 as i128)
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / QUOTE_PRECISION, self.0 % QUOTE_PRECISION)
    }
}

// 1.3: share-precision amount (6 decimals). pool share balances and supply.
// u128 because share supply compounds across the life of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Shares(u128);

impl Shares {
    pub const ZERO: Shares = Shares(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(&self, other: Shares) -> Result<Shares, MathError> {
        Ok(Shares(math::add_u128(self.0, other.0)?))
    }

    pub fn checked_sub(&self, other: Shares) -> Result<Shares, MathError> {
        Ok(Shares(math::sub_u128(self.0, other.0)?))
    }
}

impl fmt::Display for Shares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = SHARE_PRECISION as u128;
        write!(f, "{}.{:06}", self.0 / p, self.0 % p)
    }
}

// 1.4: signed quote-precision amount. pnl and NAV, which can go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignedQuote(i128);

impl SignedQuote {
    pub const ZERO: SignedQuote = SignedQuote(0);

    pub fn new(raw: i128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(&self, other: SignedQuote) -> Result<SignedQuote, MathError> {
        Ok(SignedQuote(math::add_i128(self.0, other.0)?))
    }

    pub fn checked_sub(&self, other: SignedQuote) -> Result<SignedQuote, MathError> {
        Ok(SignedQuote(math::sub_i128(self.0, other.0)?))
    }
}

impl fmt::Display for SignedQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = QUOTE_PRECISION as i128;
        let sign = if self.0 < 0 { "-" } else { "" };
        let mag = self.0.unsigned_abs();
        write!(f, "{}{}.{:06}", sign, mag / p as u128, mag % p as u128)
    }
}

// 1.5: oracle price in quote per unit of base (9 decimals). must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(u64);

impl Price {
    #[must_use]
    pub fn new(raw: u64) -> Option<Self> {
        if raw > 0 {
            Some(Self(raw))
        } else {
            None
        }
    }

    pub fn new_unchecked(raw: u64) -> Self {
        debug_assert!(raw > 0);
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.0 / PRICE_PRECISION, self.0 % PRICE_PRECISION)
    }
}

// 1.6: NAV per share in quote per share (9 decimals, same scale as Price).
// wide because NAV-per-share of a long-lived profitable pool can exceed
// any oracle price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SharePrice(u128);

impl SharePrice {
    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }
}

impl From<Price> for SharePrice {
    fn from(p: Price) -> Self {
        SharePrice(p.raw() as u128)
    }
}

impl fmt::Display for SharePrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = PRICE_PRECISION as u128;
        write!(f, "{}.{:09}", self.0 / p, self.0 % p)
    }
}
