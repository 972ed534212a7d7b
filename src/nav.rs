//! NAV accounting: values the pool as vault collateral plus the pnl
//! attributed to its market-making exposure.
//!
//! A snapshot is a derived view, never authoritative state. Every settlement
//! operation recomputes it from live inputs under the pool's lock; a cached
//! snapshot would let two depositors mint against the same stale NAV.

use crate::math::{self, MathError, PRICE_PRECISION};
use crate::types::{PoolId, Price, Quote, SharePrice, Shares, SignedQuote, Timestamp};
use serde::{Deserialize, Serialize};

/// Ephemeral valuation of a pool at one instant. Computed, consumed,
/// discarded; never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NavSnapshot {
    pub pool_id: PoolId,
    pub vault_collateral: Quote,
    pub attributed_pnl: SignedQuote,
    pub oracle_price: Price,
    pub total_shares: Shares,
    /// vault collateral + attributed pnl, quote precision, signed
    pub nav: SignedQuote,
    pub computed_at: Timestamp,
}

impl NavSnapshot {
    /// Losses exceed (or exactly consume) the pool's value while shares are
    /// outstanding. An empty pool is never insolvent; it is bootstrappable.
    pub fn is_insolvent(&self) -> bool {
        !self.total_shares.is_zero() && self.nav.raw() <= 0
    }

    /// NAV per share in price precision. Bootstrap price when no shares are
    /// outstanding; None when the pool is insolvent (no meaningful price).
    pub fn share_price(&self, bootstrap: Price) -> Option<SharePrice> {
        if self.total_shares.is_zero() {
            return Some(SharePrice::from(bootstrap));
        }
        if self.nav.raw() <= 0 {
            return None;
        }
        // quote and share precisions match, so this is dimensionally
        // quote-per-share scaled to PRICE_PRECISION
        math::mul_div_floor(
            self.nav.raw() as u128,
            PRICE_PRECISION as u128,
            self.total_shares.raw(),
        )
        .ok()
        .map(SharePrice::new)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("stale oracle data: age {age_ms}ms exceeds threshold {max_age_ms}ms")]
    StaleOracleData { age_ms: i64, max_age_ms: i64 },

    #[error("nav arithmetic failed: {0}")]
    Math(#[from] MathError),
}

// 6.1: the only NAV formula in the crate. staleness is enforced here as a
// precondition even though the threshold is owned by the oracle collaborator.
pub fn compute_nav(
    pool_id: PoolId,
    vault_collateral: Quote,
    total_shares: Shares,
    attributed_pnl: SignedQuote,
    oracle_price: Price,
    oracle_timestamp: Timestamp,
    max_staleness_ms: i64,
    now: Timestamp,
) -> Result<NavSnapshot, NavError> {
    let age_ms = now.age_of(oracle_timestamp);
    if age_ms > max_staleness_ms {
        return Err(NavError::StaleOracleData {
            age_ms,
            max_age_ms: max_staleness_ms,
        });
    }

    let nav = SignedQuote::from(vault_collateral).checked_add(attributed_pnl)?;

    Ok(NavSnapshot {
        pool_id,
        vault_collateral,
        attributed_pnl,
        oracle_price,
        total_shares,
        nav,
        computed_at: now,
    })
}
