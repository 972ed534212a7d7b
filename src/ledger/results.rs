// 8.0.2: receipts and errors for ledger operations.

use crate::math::MathError;
use crate::nav::NavError;
use crate::pool::PoolError;
use crate::price_feed::FeedError;
use crate::types::{DepositorId, MarketId, PoolId, Quote, SharePrice, Shares, SignedQuote, Timestamp};
use crate::vault::VaultError;
use serde::{Deserialize, Serialize};

/// Result of a completed fund settlement. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundReceipt {
    pub pool_id: PoolId,
    pub depositor: DepositorId,
    pub amount: Quote,
    pub shares_minted: Shares,
    pub nav_per_share: SharePrice,
    pub timestamp: Timestamp,
}

/// Result of a completed withdraw settlement. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawReceipt {
    pub pool_id: PoolId,
    pub depositor: DepositorId,
    pub amount: Quote,
    pub shares_burned: Shares,
    pub nav_per_share: SharePrice,
    pub timestamp: Timestamp,
}

/// Result of realized-pnl settlement between the market and the vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlSettlement {
    pub pool_id: PoolId,
    pub delta: SignedQuote,
    pub new_collateral: Quote,
    pub cumulative_realized_pnl: SignedQuote,
    pub timestamp: Timestamp,
}

/// Entry in the append-only mint/burn audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Receipt {
    Fund(FundReceipt),
    Withdraw(WithdrawReceipt),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("arithmetic error: {0}")]
    Math(#[from] MathError),

    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("nav error: {0}")]
    Nav(#[from] NavError),

    #[error("pool {pool_id:?} is insolvent: nav {nav}, withdrawals blocked")]
    NavInsolvent { pool_id: PoolId, nav: SignedQuote },

    #[error("amount must be positive and large enough to price")]
    InvalidAmount,

    #[error("upstream read timed out for market {0:?}")]
    UpstreamTimeout(MarketId),

    #[error("upstream unavailable for market {0:?}")]
    UpstreamUnavailable(MarketId),
}

impl LedgerError {
    pub(crate) fn from_feed(err: FeedError) -> Self {
        match err {
            FeedError::Timeout(market_id) => LedgerError::UpstreamTimeout(market_id),
            FeedError::Unavailable(market_id) => LedgerError::UpstreamUnavailable(market_id),
            FeedError::UnknownMarket(market_id) => {
                LedgerError::Pool(PoolError::InvalidMarket { market_id })
            }
        }
    }

    /// Only upstream timeouts are retry-eligible, and only by the caller
    /// with its own retry budget. The ledger never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::UpstreamTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_errors_map_to_taxonomy() {
        let market = MarketId(4);
        assert!(matches!(
            LedgerError::from_feed(FeedError::Timeout(market)),
            LedgerError::UpstreamTimeout(_)
        ));
        assert!(matches!(
            LedgerError::from_feed(FeedError::UnknownMarket(market)),
            LedgerError::Pool(PoolError::InvalidMarket { .. })
        ));
    }

    #[test]
    fn only_timeouts_are_retryable() {
        assert!(LedgerError::UpstreamTimeout(MarketId(1)).is_retryable());
        assert!(!LedgerError::InvalidAmount.is_retryable());
        assert!(!LedgerError::Math(MathError::Overflow).is_retryable());
        assert!(!LedgerError::UpstreamUnavailable(MarketId(1)).is_retryable());
    }

    #[test]
    fn receipts_serialize_for_audit_export() {
        let receipt = Receipt::Fund(FundReceipt {
            pool_id: PoolId(1),
            depositor: DepositorId(9),
            amount: Quote::new(1_000_000),
            shares_minted: Shares::new(1_000_000),
            nav_per_share: SharePrice::new(1_000_000_000),
            timestamp: Timestamp::from_millis(42),
        });

        let json = serde_json::to_string(&receipt).unwrap();
        let back: Receipt = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, Receipt::Fund(r) if r.depositor == DepositorId(9)));
    }
}
