//! Pool record, configuration, and lifecycle state machine.
//!
//! A pool binds one ledger aggregate to one perpetual market. Lifecycle:
//! Uninitialized -> Active at creation, Active <-> Paused administratively,
//! Active -> Closed once the share supply has returned to zero. Closed is
//! terminal.

use crate::types::{MarketId, PoolId, Price, Shares, SignedQuote, Timestamp};
use crate::math::PRICE_PRECISION;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    Uninitialized,
    Active,
    Paused,
    Closed,
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PoolStatus::Uninitialized => "uninitialized",
            PoolStatus::Active => "active",
            PoolStatus::Paused => "paused",
            PoolStatus::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

/// Configuration supplied at pool initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolParams {
    pub market_id: MarketId,
    pub name: String,
    /// quote per share for the first mint into an empty pool (default 1:1)
    pub bootstrap_share_price: Price,
    /// whether LPs may exit while the pool is administratively paused
    pub allow_withdraw_while_paused: bool,
}

impl PoolParams {
    pub fn new(market_id: MarketId, name: impl Into<String>) -> Self {
        Self {
            market_id,
            name: name.into(),
            bootstrap_share_price: Price::new_unchecked(PRICE_PRECISION),
            allow_withdraw_while_paused: false,
        }
    }

    pub fn with_bootstrap_price(mut self, price: Price) -> Self {
        self.bootstrap_share_price = price;
        self
    }

    pub fn with_withdraw_while_paused(mut self, allow: bool) -> Self {
        self.allow_withdraw_while_paused = allow;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub market_id: MarketId,
    pub name: String,
    pub status: PoolStatus,
    pub bootstrap_share_price: Price,
    pub allow_withdraw_while_paused: bool,
    /// realized pnl settled into the vault over the pool's lifetime
    pub cumulative_realized_pnl: SignedQuote,
    pub created_at: Timestamp,
}

impl Pool {
    pub fn new(id: PoolId, params: PoolParams, timestamp: Timestamp) -> Self {
        Self {
            id,
            market_id: params.market_id,
            name: params.name,
            status: PoolStatus::Uninitialized,
            bootstrap_share_price: params.bootstrap_share_price,
            allow_withdraw_while_paused: params.allow_withdraw_while_paused,
            cumulative_realized_pnl: SignedQuote::ZERO,
            created_at: timestamp,
        }
    }

    pub fn activate(&mut self) -> Result<(), PoolError> {
        if self.status != PoolStatus::Uninitialized {
            return Err(self.invalid_transition(PoolStatus::Active));
        }
        self.status = PoolStatus::Active;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PoolError> {
        if self.status != PoolStatus::Active {
            return Err(self.invalid_transition(PoolStatus::Paused));
        }
        self.status = PoolStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PoolError> {
        if self.status != PoolStatus::Paused {
            return Err(self.invalid_transition(PoolStatus::Active));
        }
        self.status = PoolStatus::Active;
        Ok(())
    }

    /// Closure requires an active pool whose share supply is back to zero.
    /// Residual dust collateral does not block closure.
    pub fn close(&mut self, total_shares: Shares) -> Result<(), PoolError> {
        if self.status != PoolStatus::Active {
            return Err(self.invalid_transition(PoolStatus::Closed));
        }
        if !total_shares.is_zero() {
            return Err(PoolError::PoolNotEmpty {
                pool_id: self.id,
                total_shares,
            });
        }
        self.status = PoolStatus::Closed;
        Ok(())
    }

    pub fn can_fund(&self) -> Result<(), PoolError> {
        match self.status {
            PoolStatus::Active => Ok(()),
            PoolStatus::Paused => Err(PoolError::PoolPaused { pool_id: self.id }),
            PoolStatus::Closed => Err(PoolError::PoolClosed { pool_id: self.id }),
            PoolStatus::Uninitialized => Err(PoolError::PoolNotInitialized { pool_id: self.id }),
        }
    }

    pub fn can_withdraw(&self) -> Result<(), PoolError> {
        match self.status {
            PoolStatus::Active => Ok(()),
            PoolStatus::Paused if self.allow_withdraw_while_paused => Ok(()),
            PoolStatus::Paused => Err(PoolError::PoolPaused { pool_id: self.id }),
            PoolStatus::Closed => Err(PoolError::PoolClosed { pool_id: self.id }),
            PoolStatus::Uninitialized => Err(PoolError::PoolNotInitialized { pool_id: self.id }),
        }
    }

    // pnl keeps settling while funding is suspended
    pub fn can_settle(&self) -> Result<(), PoolError> {
        match self.status {
            PoolStatus::Active | PoolStatus::Paused => Ok(()),
            PoolStatus::Closed => Err(PoolError::PoolClosed { pool_id: self.id }),
            PoolStatus::Uninitialized => Err(PoolError::PoolNotInitialized { pool_id: self.id }),
        }
    }

    fn invalid_transition(&self, to: PoolStatus) -> PoolError {
        PoolError::InvalidTransition {
            pool_id: self.id,
            from: self.status,
            to,
        }
    }
}

/// Administrative action requiring external authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    Pause,
    Resume,
    Close,
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AdminAction::Pause => "pause",
            AdminAction::Resume => "resume",
            AdminAction::Close => "close",
        };
        write!(f, "{s}")
    }
}

/// Yes/no decision for administrative lifecycle transitions. The decision
/// itself (keys, governance, multisig) lives outside the core.
pub trait AdminPolicy: Send + Sync {
    fn authorize(&self, action: AdminAction, pool_id: PoolId) -> bool;
}

/// Default policy: every administrative action is allowed.
#[derive(Debug, Default)]
pub struct AllowAllAdmin;

impl AdminPolicy for AllowAllAdmin {
    fn authorize(&self, _action: AdminAction, _pool_id: PoolId) -> bool {
        true
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PoolError {
    #[error("a pool already exists for market {market_id:?}")]
    PoolAlreadyExists { market_id: MarketId },

    #[error("market {market_id:?} is not a known tradable market")]
    InvalidMarket { market_id: MarketId },

    #[error("pool {pool_id:?} not found")]
    PoolNotFound { pool_id: PoolId },

    #[error("pool {pool_id:?} still has {total_shares} shares outstanding")]
    PoolNotEmpty {
        pool_id: PoolId,
        total_shares: Shares,
    },

    #[error("pool {pool_id:?} is paused")]
    PoolPaused { pool_id: PoolId },

    #[error("pool {pool_id:?} is closed")]
    PoolClosed { pool_id: PoolId },

    #[error("pool {pool_id:?} is not initialized")]
    PoolNotInitialized { pool_id: PoolId },

    #[error("invalid transition for pool {pool_id:?}: {from} -> {to}")]
    InvalidTransition {
        pool_id: PoolId,
        from: PoolStatus,
        to: PoolStatus,
    },

    #[error("not authorized to {action} pool {pool_id:?}")]
    NotAuthorized { action: AdminAction, pool_id: PoolId },
}
