// 8.0 ledger/core.rs: the pool arena. each pool is an independently lockable
// aggregate; operations on different pools run in parallel, operations on the
// same pool serialize on its mutex. there is no process-wide settlement lock.
//
// lock order, where more than one is held: market_index -> pools -> one pool's
// mutex -> receipts/events. no path acquires them in any other order.

use super::results::{LedgerError, Receipt};
use crate::config::LedgerConfig;
use crate::events::{
    Event, EventId, EventPayload, PoolClosedEvent, PoolInitializedEvent, PoolPausedEvent,
    PoolResumedEvent,
};
use crate::nav::{compute_nav, NavSnapshot};
use crate::pool::{AdminAction, AdminPolicy, AllowAllAdmin, Pool, PoolError, PoolParams};
use crate::position_feed::{attributed_pnl, MarketPositionProvider};
use crate::price_feed::OracleProvider;
use crate::types::{DepositorId, MarketId, PoolId, Quote, Shares, Timestamp};
use crate::vault::Vault;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/** 8.1: one pool's full persistable state: record + vault */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolState {
    pub pool: Pool,
    pub vault: Vault,
}

impl PoolState {
    fn new(pool: Pool) -> Self {
        Self {
            pool,
            vault: Vault::new(),
        }
    }
}

/** 8.2: the ledger. owns every pool, the market binding index, and the
audit logs. all methods take &self; per-pool mutexes do the serialization. */
pub struct PoolLedger {
    config: LedgerConfig,
    oracle: Arc<dyn OracleProvider>,
    markets: Arc<dyn MarketPositionProvider>,
    admin: Arc<dyn AdminPolicy>,
    pools: RwLock<HashMap<PoolId, Arc<Mutex<PoolState>>>>,
    market_index: Mutex<HashMap<MarketId, Vec<PoolId>>>,
    next_pool_id: AtomicU32,
    pub(super) receipts: Mutex<Vec<Receipt>>,
    events: Mutex<Vec<Event>>,
    next_event_id: AtomicU64,
}

impl PoolLedger {
    pub fn new(
        config: LedgerConfig,
        oracle: Arc<dyn OracleProvider>,
        markets: Arc<dyn MarketPositionProvider>,
    ) -> Self {
        Self {
            config,
            oracle,
            markets,
            admin: Arc::new(AllowAllAdmin),
            pools: RwLock::new(HashMap::new()),
            market_index: Mutex::new(HashMap::new()),
            next_pool_id: AtomicU32::new(1),
            receipts: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            next_event_id: AtomicU64::new(1),
        }
    }

    pub fn with_admin(mut self, admin: Arc<dyn AdminPolicy>) -> Self {
        self.admin = admin;
        self
    }

    // 8.3: bind a new pool to a market. the market must be known to the
    // position provider; one pool per market unless configured otherwise.
    pub fn initialize(&self, params: PoolParams, now: Timestamp) -> Result<PoolId, LedgerError> {
        let market_id = params.market_id;
        self.markets
            .market_position(market_id)
            .map_err(LedgerError::from_feed)?;

        let mut index = self.market_index.lock().expect("market index poisoned");
        if !self.config.allow_multiple_pools_per_market
            && index.get(&market_id).is_some_and(|ids| !ids.is_empty())
        {
            return Err(PoolError::PoolAlreadyExists { market_id }.into());
        }

        let pool_id = PoolId(self.next_pool_id.fetch_add(1, Ordering::SeqCst));
        let name = params.name.clone();
        let mut pool = Pool::new(pool_id, params, now);
        pool.activate()?;

        index.entry(market_id).or_default().push(pool_id);
        self.pools
            .write()
            .expect("pool registry poisoned")
            .insert(pool_id, Arc::new(Mutex::new(PoolState::new(pool))));
        drop(index);

        self.emit(
            now,
            EventPayload::PoolInitialized(PoolInitializedEvent {
                pool_id,
                market_id,
                name,
            }),
        );
        Ok(pool_id)
    }

    pub fn pause(&self, pool_id: PoolId, now: Timestamp) -> Result<(), LedgerError> {
        self.authorize(AdminAction::Pause, pool_id)?;
        let handle = self.pool_handle(pool_id)?;
        let mut state = handle.lock().expect("pool lock poisoned");
        state.pool.pause()?;
        self.emit(now, EventPayload::PoolPaused(PoolPausedEvent { pool_id }));
        Ok(())
    }

    pub fn resume(&self, pool_id: PoolId, now: Timestamp) -> Result<(), LedgerError> {
        self.authorize(AdminAction::Resume, pool_id)?;
        let handle = self.pool_handle(pool_id)?;
        let mut state = handle.lock().expect("pool lock poisoned");
        state.pool.resume()?;
        self.emit(now, EventPayload::PoolResumed(PoolResumedEvent { pool_id }));
        Ok(())
    }

    // 8.4: terminal. requires zero shares outstanding; unbinds the market so
    // a successor pool can be initialized for it.
    pub fn close(&self, pool_id: PoolId, now: Timestamp) -> Result<(), LedgerError> {
        self.authorize(AdminAction::Close, pool_id)?;
        let handle = self.pool_handle(pool_id)?;
        let mut state = handle.lock().expect("pool lock poisoned");
        let total_shares = state.vault.total_shares();
        state.pool.close(total_shares)?;
        let market_id = state.pool.market_id;
        let residual_collateral = state.vault.collateral();
        drop(state);

        let mut index = self.market_index.lock().expect("market index poisoned");
        if let Some(ids) = index.get_mut(&market_id) {
            ids.retain(|id| *id != pool_id);
        }
        drop(index);

        self.emit(
            now,
            EventPayload::PoolClosed(PoolClosedEvent {
                pool_id,
                residual_collateral,
            }),
        );
        Ok(())
    }

    // 8.5: display read. copies the vault totals under a brief lock, then
    // values the pool off-lock; the result may be superseded immediately.
    pub fn get_nav(&self, pool_id: PoolId, now: Timestamp) -> Result<NavSnapshot, LedgerError> {
        let handle = self.pool_handle(pool_id)?;
        let (market_id, collateral, total_shares) = {
            let state = handle.lock().expect("pool lock poisoned");
            (
                state.pool.market_id,
                state.vault.collateral(),
                state.vault.total_shares(),
            )
        };
        self.value_view(pool_id, market_id, collateral, total_shares, now)
    }

    pub fn get_share_balance(
        &self,
        pool_id: PoolId,
        depositor: DepositorId,
    ) -> Result<Shares, LedgerError> {
        let handle = self.pool_handle(pool_id)?;
        let state = handle.lock().expect("pool lock poisoned");
        Ok(state.vault.share_balance(depositor))
    }

    /// Full persistable state of one pool, copied at a consistent point.
    pub fn pool_snapshot(&self, pool_id: PoolId) -> Result<PoolState, LedgerError> {
        let handle = self.pool_handle(pool_id)?;
        let state = handle.lock().expect("pool lock poisoned");
        Ok(state.clone())
    }

    pub fn pool_ids(&self) -> Vec<PoolId> {
        let mut ids: Vec<PoolId> = self
            .pools
            .read()
            .expect("pool registry poisoned")
            .keys()
            .copied()
            .collect();
        ids.sort();
        ids
    }

    /// Append-only mint/burn audit trail, oldest first.
    pub fn receipts(&self) -> Vec<Receipt> {
        self.receipts.lock().expect("receipt log poisoned").clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().expect("event log poisoned").clone()
    }

    pub fn recent_events(&self, count: usize) -> Vec<Event> {
        let events = self.events.lock().expect("event log poisoned");
        let start = events.len().saturating_sub(count);
        events[start..].to_vec()
    }

    pub(super) fn pool_handle(&self, pool_id: PoolId) -> Result<Arc<Mutex<PoolState>>, LedgerError> {
        self.pools
            .read()
            .expect("pool registry poisoned")
            .get(&pool_id)
            .cloned()
            .ok_or_else(|| PoolError::PoolNotFound { pool_id }.into())
    }

    // 8.6: value a pool while its settlement lock is held. the provider
    // reads happen under the lock so no other settlement can slip a
    // mutation between the snapshot and the mint/burn that prices off it.
    pub(super) fn value_pool_locked(
        &self,
        state: &MutexGuard<'_, PoolState>,
        now: Timestamp,
    ) -> Result<NavSnapshot, LedgerError> {
        self.value_view(
            state.pool.id,
            state.pool.market_id,
            state.vault.collateral(),
            state.vault.total_shares(),
            now,
        )
    }

    fn value_view(
        &self,
        pool_id: PoolId,
        market_id: MarketId,
        collateral: Quote,
        total_shares: Shares,
        now: Timestamp,
    ) -> Result<NavSnapshot, LedgerError> {
        let oracle = self
            .oracle
            .price(market_id)
            .map_err(LedgerError::from_feed)?;
        let position = self
            .markets
            .market_position(market_id)
            .map_err(LedgerError::from_feed)?;
        let pnl = attributed_pnl(&position, oracle.price)?;

        Ok(compute_nav(
            pool_id,
            collateral,
            total_shares,
            pnl,
            oracle.price,
            oracle.timestamp,
            self.config.max_oracle_staleness_ms,
            now,
        )?)
    }

    pub(super) fn emit(&self, now: Timestamp, payload: EventPayload) {
        let id = EventId(self.next_event_id.fetch_add(1, Ordering::SeqCst));
        let mut events = self.events.lock().expect("event log poisoned");
        events.push(Event::new(id, now, payload));
        if events.len() > self.config.max_events {
            let drain = events.len() - self.config.max_events;
            events.drain(0..drain);
        }
    }

    fn authorize(&self, action: AdminAction, pool_id: PoolId) -> Result<(), LedgerError> {
        if self.admin.authorize(action, pool_id) {
            Ok(())
        } else {
            Err(PoolError::NotAuthorized { action, pool_id }.into())
        }
    }
}
