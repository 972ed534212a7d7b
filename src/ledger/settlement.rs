// 8.7 ledger/settlement.rs: the fund/withdraw/settle protocol. each operation
// holds its pool's mutex from snapshot read through mutation, validates every
// leg with checked math before touching state, and emits a receipt plus an
// audit event once the mutation commits. a failure at any step before the
// mutation leaves no trace; after it, the operation is irrevocable.

use super::core::PoolLedger;
use super::results::{FundReceipt, LedgerError, PnlSettlement, Receipt, WithdrawReceipt};
use crate::events::{EventPayload, FundedEvent, PnlSettledEvent, WithdrawRejectedEvent, WithdrawnEvent};
use crate::math::{self, MathError, PRICE_PRECISION};
use crate::types::{DepositorId, PoolId, Price, Quote, SharePrice, Shares, SignedQuote, Timestamp};
use crate::vault::VaultError;

// 8.8: shares minted for a deposit, floor-rounded in the pool's favor.
// proportional to the live NAV when the pool holds value; priced at the
// bootstrap share price for the first mint and for recapitalization of an
// insolvent pool (the only well-defined price when NAV <= 0).
pub(crate) fn shares_for_deposit(
    amount: Quote,
    total_shares: Shares,
    nav: SignedQuote,
    bootstrap: Price,
) -> Result<Shares, MathError> {
    if total_shares.is_zero() || nav.raw() <= 0 {
        let raw = math::mul_div_floor(
            amount.raw() as u128,
            PRICE_PRECISION as u128,
            bootstrap.raw() as u128,
        )?;
        return Ok(Shares::new(raw));
    }
    let raw = math::mul_div_floor(amount.raw() as u128, total_shares.raw(), nav.raw() as u128)?;
    Ok(Shares::new(raw))
}

// 8.9: quote paid out for burned shares, floor-rounded in the pool's favor.
// caller guarantees nav > 0 and shares <= total_shares.
pub(crate) fn quote_for_shares(
    shares: Shares,
    total_shares: Shares,
    nav: SignedQuote,
) -> Result<Quote, MathError> {
    let raw = math::mul_div_floor(shares.raw(), nav.raw() as u128, total_shares.raw())?;
    Ok(Quote::new(math::u128_to_u64(raw)?))
}

impl PoolLedger {
    // 8.10: fund. snapshot read, share computation, collateral credit and
    // share mint execute under the pool lock as one serialized sequence.
    pub fn fund(
        &self,
        pool_id: PoolId,
        depositor: DepositorId,
        amount: Quote,
        now: Timestamp,
    ) -> Result<FundReceipt, LedgerError> {
        let handle = self.pool_handle(pool_id)?;
        let mut state = handle.lock().expect("pool lock poisoned");

        state.pool.can_fund()?;
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let snapshot = self.value_pool_locked(&state, now)?;
        let bootstrap = state.pool.bootstrap_share_price;
        let shares = shares_for_deposit(amount, snapshot.total_shares, snapshot.nav, bootstrap)?;
        if shares.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        let nav_per_share = snapshot
            .share_price(bootstrap)
            .unwrap_or_else(|| SharePrice::from(bootstrap));

        state.vault.apply_fund(depositor, amount, shares)?;
        debug_assert!(state.vault.shares_conserved());

        let receipt = FundReceipt {
            pool_id,
            depositor,
            amount,
            shares_minted: shares,
            nav_per_share,
            timestamp: now,
        };
        self.emit(
            now,
            EventPayload::Funded(FundedEvent {
                pool_id,
                depositor,
                amount,
                shares_minted: shares,
                nav_per_share,
                new_total_shares: state.vault.total_shares(),
            }),
        );
        self.receipts
            .lock()
            .expect("receipt log poisoned")
            .push(Receipt::Fund(receipt.clone()));
        Ok(receipt)
    }

    // 8.11: withdraw. the payout is capped by what the vault actually holds:
    // capital deployed as market margin can make available liquidity less
    // than proportional NAV, a documented partial-liquidity rejection.
    pub fn withdraw(
        &self,
        pool_id: PoolId,
        depositor: DepositorId,
        shares_amount: Shares,
        now: Timestamp,
    ) -> Result<WithdrawReceipt, LedgerError> {
        let handle = self.pool_handle(pool_id)?;
        let mut state = handle.lock().expect("pool lock poisoned");

        state.pool.can_withdraw()?;
        if shares_amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        let held = state.vault.share_balance(depositor);
        if shares_amount > held {
            let err = VaultError::InsufficientShareBalance {
                depositor,
                requested: shares_amount,
                available: held,
            };
            self.reject_withdraw(pool_id, depositor, shares_amount, &err.to_string(), now);
            return Err(err.into());
        }

        let snapshot = self.value_pool_locked(&state, now)?;
        if snapshot.nav.raw() <= 0 {
            let err = LedgerError::NavInsolvent {
                pool_id,
                nav: snapshot.nav,
            };
            self.reject_withdraw(pool_id, depositor, shares_amount, &err.to_string(), now);
            return Err(err);
        }

        let payout = quote_for_shares(shares_amount, snapshot.total_shares, snapshot.nav)?;
        if payout.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        if payout > state.vault.collateral() {
            let err = VaultError::InsufficientVaultBalance {
                requested: payout,
                available: state.vault.collateral(),
            };
            self.reject_withdraw(pool_id, depositor, shares_amount, &err.to_string(), now);
            return Err(err.into());
        }

        let nav_per_share = snapshot
            .share_price(state.pool.bootstrap_share_price)
            .ok_or(LedgerError::Math(MathError::Overflow))?;

        state.vault.apply_withdraw(depositor, payout, shares_amount)?;
        debug_assert!(state.vault.shares_conserved());

        let receipt = WithdrawReceipt {
            pool_id,
            depositor,
            amount: payout,
            shares_burned: shares_amount,
            nav_per_share,
            timestamp: now,
        };
        self.emit(
            now,
            EventPayload::Withdrawn(WithdrawnEvent {
                pool_id,
                depositor,
                amount: payout,
                shares_burned: shares_amount,
                nav_per_share,
                new_total_shares: state.vault.total_shares(),
            }),
        );
        self.receipts
            .lock()
            .expect("receipt log poisoned")
            .push(Receipt::Withdraw(receipt.clone()));
        Ok(receipt)
    }

    // 8.12: settle realized pnl between the bound market and the vault.
    // positive deltas credit collateral, losses debit it. runs while active
    // or paused; markets keep settling whether or not funding is suspended.
    pub fn settle_pnl(
        &self,
        pool_id: PoolId,
        delta: SignedQuote,
        now: Timestamp,
    ) -> Result<PnlSettlement, LedgerError> {
        let handle = self.pool_handle(pool_id)?;
        let mut state = handle.lock().expect("pool lock poisoned");

        state.pool.can_settle()?;
        if delta.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }

        // validate the cumulative counter before mutating the vault
        let cumulative = state.pool.cumulative_realized_pnl.checked_add(delta)?;

        let magnitude = Quote::new(math::u128_to_u64(delta.raw().unsigned_abs())?);
        if delta.is_positive() {
            state.vault.credit_collateral(magnitude)?;
        } else {
            state.vault.debit_collateral(magnitude)?;
        }
        state.pool.cumulative_realized_pnl = cumulative;

        let settlement = PnlSettlement {
            pool_id,
            delta,
            new_collateral: state.vault.collateral(),
            cumulative_realized_pnl: cumulative,
            timestamp: now,
        };
        self.emit(
            now,
            EventPayload::PnlSettled(PnlSettledEvent {
                pool_id,
                delta,
                new_collateral: settlement.new_collateral,
                cumulative_realized_pnl: cumulative,
            }),
        );
        Ok(settlement)
    }

    fn reject_withdraw(
        &self,
        pool_id: PoolId,
        depositor: DepositorId,
        shares_requested: Shares,
        reason: &str,
        now: Timestamp,
    ) {
        self.emit(
            now,
            EventPayload::WithdrawRejected(WithdrawRejectedEvent {
                pool_id,
                depositor,
                shares_requested,
                reason: reason.to_string(),
            }),
        );
    }
}
