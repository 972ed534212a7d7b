// 9.0: every state change produces an event. used for audit trails, state
// reconstruction, and notifying external systems. rejected withdrawals are
// recorded too so the audit trail explains why an LP's exit did not happen.

use crate::types::{
    DepositorId, MarketId, PoolId, Quote, SharePrice, Shares, SignedQuote, Timestamp,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Lifecycle events
    PoolInitialized(PoolInitializedEvent),
    PoolPaused(PoolPausedEvent),
    PoolResumed(PoolResumedEvent),
    PoolClosed(PoolClosedEvent),

    // Settlement events
    Funded(FundedEvent),
    Withdrawn(WithdrawnEvent),
    WithdrawRejected(WithdrawRejectedEvent),
    PnlSettled(PnlSettledEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolInitializedEvent {
    pub pool_id: PoolId,
    pub market_id: MarketId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolPausedEvent {
    pub pool_id: PoolId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolResumedEvent {
    pub pool_id: PoolId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolClosedEvent {
    pub pool_id: PoolId,
    /// dust stranded by floor rounding stays with the pool and is reported
    /// at closure for external disposal
    pub residual_collateral: Quote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundedEvent {
    pub pool_id: PoolId,
    pub depositor: DepositorId,
    pub amount: Quote,
    pub shares_minted: Shares,
    pub nav_per_share: SharePrice,
    pub new_total_shares: Shares,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawnEvent {
    pub pool_id: PoolId,
    pub depositor: DepositorId,
    pub amount: Quote,
    pub shares_burned: Shares,
    pub nav_per_share: SharePrice,
    pub new_total_shares: Shares,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRejectedEvent {
    pub pool_id: PoolId,
    pub depositor: DepositorId,
    pub shares_requested: Shares,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlSettledEvent {
    pub pool_id: PoolId,
    pub delta: SignedQuote,
    pub new_collateral: Quote,
    pub cumulative_realized_pnl: SignedQuote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_construction() {
        let event = Event::new(
            EventId(1),
            Timestamp::from_millis(1_000),
            EventPayload::Funded(FundedEvent {
                pool_id: PoolId(1),
                depositor: DepositorId(7),
                amount: Quote::new(1_000_000),
                shares_minted: Shares::new(1_000_000),
                nav_per_share: SharePrice::new(1_000_000_000),
                new_total_shares: Shares::new(1_000_000),
            }),
        );

        assert_eq!(event.id, EventId(1));
        assert!(matches!(event.payload, EventPayload::Funded(_)));
    }

    #[test]
    fn events_serialize_for_audit_export() {
        let event = Event::new(
            EventId(2),
            Timestamp::from_millis(5_000),
            EventPayload::WithdrawRejected(WithdrawRejectedEvent {
                pool_id: PoolId(1),
                depositor: DepositorId(3),
                shares_requested: Shares::new(500_000),
                reason: "nav insolvent".to_string(),
            }),
        );

        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, EventId(2));
        assert!(matches!(back.payload, EventPayload::WithdrawRejected(_)));
    }
}
