//! Vault ledger: the single source of truth for pooled collateral, total
//! share supply, and per-depositor share balances.
//!
//! The vault only moves value as part of a settlement sequence that holds the
//! owning pool's lock. The two-leg mutators (apply_fund, apply_withdraw)
//! compute every new balance with checked math before assigning any field,
//! so a failed operation leaves no partial state behind.

use crate::math::MathError;
use crate::types::{DepositorId, Quote, Shares};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vault {
    collateral: Quote,
    total_shares: Shares,
    balances: HashMap<DepositorId, Shares>,
}

impl Default for Vault {
    fn default() -> Self {
        Self::new()
    }
}

impl Vault {
    pub fn new() -> Self {
        Self {
            collateral: Quote::ZERO,
            total_shares: Shares::ZERO,
            balances: HashMap::new(),
        }
    }

    pub fn collateral(&self) -> Quote {
        self.collateral
    }

    pub fn total_shares(&self) -> Shares {
        self.total_shares
    }

    // zero for unknown depositors; entries are dropped once a balance hits zero
    pub fn share_balance(&self, depositor: DepositorId) -> Shares {
        self.balances.get(&depositor).copied().unwrap_or(Shares::ZERO)
    }

    pub fn depositor_count(&self) -> usize {
        self.balances.len()
    }

    pub fn balances(&self) -> impl Iterator<Item = (&DepositorId, &Shares)> {
        self.balances.iter()
    }

    pub fn credit_collateral(&mut self, amount: Quote) -> Result<(), VaultError> {
        self.collateral = self.collateral.checked_add(amount)?;
        Ok(())
    }

    pub fn debit_collateral(&mut self, amount: Quote) -> Result<(), VaultError> {
        if amount > self.collateral {
            return Err(VaultError::InsufficientVaultBalance {
                requested: amount,
                available: self.collateral,
            });
        }
        self.collateral = self.collateral.checked_sub(amount)?;
        Ok(())
    }

    pub fn mint_shares(&mut self, depositor: DepositorId, amount: Shares) -> Result<(), VaultError> {
        let new_total = self.total_shares.checked_add(amount)?;
        let new_balance = self.share_balance(depositor).checked_add(amount)?;
        self.total_shares = new_total;
        self.balances.insert(depositor, new_balance);
        Ok(())
    }

    pub fn burn_shares(&mut self, depositor: DepositorId, amount: Shares) -> Result<(), VaultError> {
        let held = self.share_balance(depositor);
        if amount > held {
            return Err(VaultError::InsufficientShareBalance {
                depositor,
                requested: amount,
                available: held,
            });
        }
        let new_balance = held.checked_sub(amount)?;
        self.total_shares = self.total_shares.checked_sub(amount)?;
        if new_balance.is_zero() {
            self.balances.remove(&depositor);
        } else {
            self.balances.insert(depositor, new_balance);
        }
        Ok(())
    }

    // 3.1: both legs of a fund settlement as one atomic mutation. every new
    // balance is computed with checked math before any field is assigned, so
    // a failure leaves the vault untouched.
    pub fn apply_fund(
        &mut self,
        depositor: DepositorId,
        amount: Quote,
        shares: Shares,
    ) -> Result<(), VaultError> {
        let new_collateral = self.collateral.checked_add(amount)?;
        let new_total = self.total_shares.checked_add(shares)?;
        let new_balance = self.share_balance(depositor).checked_add(shares)?;

        self.collateral = new_collateral;
        self.total_shares = new_total;
        self.balances.insert(depositor, new_balance);
        Ok(())
    }

    // 3.2: both legs of a withdraw settlement as one atomic mutation.
    pub fn apply_withdraw(
        &mut self,
        depositor: DepositorId,
        payout: Quote,
        shares: Shares,
    ) -> Result<(), VaultError> {
        if payout > self.collateral {
            return Err(VaultError::InsufficientVaultBalance {
                requested: payout,
                available: self.collateral,
            });
        }
        let held = self.share_balance(depositor);
        if shares > held {
            return Err(VaultError::InsufficientShareBalance {
                depositor,
                requested: shares,
                available: held,
            });
        }
        let new_collateral = self.collateral.checked_sub(payout)?;
        let new_total = self.total_shares.checked_sub(shares)?;
        let new_balance = held.checked_sub(shares)?;

        self.collateral = new_collateral;
        self.total_shares = new_total;
        if new_balance.is_zero() {
            self.balances.remove(&depositor);
        } else {
            self.balances.insert(depositor, new_balance);
        }
        Ok(())
    }

    // invariant check: sum of per-depositor balances equals total supply.
    // settlement asserts this after every mutation in debug builds.
    pub fn shares_conserved(&self) -> bool {
        let mut sum = Shares::ZERO;
        for held in self.balances.values() {
            match sum.checked_add(*held) {
                Ok(s) => sum = s,
                Err(_) => return false,
            }
        }
        sum == self.total_shares
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum VaultError {
    #[error("insufficient vault balance: requested {requested}, available {available}")]
    InsufficientVaultBalance { requested: Quote, available: Quote },

    #[error("insufficient share balance for {depositor:?}: requested {requested}, available {available}")]
    InsufficientShareBalance {
        depositor: DepositorId,
        requested: Shares,
        available: Shares,
    },

    #[error("vault arithmetic failed: {0}")]
    Math(#[from] MathError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_debit_roundtrip() {
        let mut vault = Vault::new();
        vault.credit_collateral(Quote::new(1_000_000)).unwrap();
        assert_eq!(vault.collateral(), Quote::new(1_000_000));

        vault.debit_collateral(Quote::new(400_000)).unwrap();
        assert_eq!(vault.collateral(), Quote::new(600_000));
    }

    #[test]
    fn debit_more_than_balance_rejected() {
        let mut vault = Vault::new();
        vault.credit_collateral(Quote::new(100)).unwrap();

        let result = vault.debit_collateral(Quote::new(101));
        assert!(matches!(
            result,
            Err(VaultError::InsufficientVaultBalance { .. })
        ));
        // nothing moved
        assert_eq!(vault.collateral(), Quote::new(100));
    }

    #[test]
    fn mint_and_burn_track_supply() {
        let mut vault = Vault::new();
        let d1 = DepositorId(1);
        let d2 = DepositorId(2);

        vault.mint_shares(d1, Shares::new(1_000_000)).unwrap();
        vault.mint_shares(d2, Shares::new(500_000)).unwrap();
        assert_eq!(vault.total_shares(), Shares::new(1_500_000));
        assert_eq!(vault.share_balance(d1), Shares::new(1_000_000));
        assert!(vault.shares_conserved());

        vault.burn_shares(d1, Shares::new(250_000)).unwrap();
        assert_eq!(vault.total_shares(), Shares::new(1_250_000));
        assert_eq!(vault.share_balance(d1), Shares::new(750_000));
        assert!(vault.shares_conserved());
    }

    #[test]
    fn burn_more_than_held_rejected() {
        let mut vault = Vault::new();
        let d1 = DepositorId(1);
        vault.mint_shares(d1, Shares::new(100)).unwrap();

        let result = vault.burn_shares(d1, Shares::new(101));
        assert!(matches!(
            result,
            Err(VaultError::InsufficientShareBalance { .. })
        ));
        assert_eq!(vault.total_shares(), Shares::new(100));
    }

    #[test]
    fn burn_from_unknown_depositor_rejected() {
        let mut vault = Vault::new();
        let result = vault.burn_shares(DepositorId(9), Shares::new(1));
        assert!(matches!(
            result,
            Err(VaultError::InsufficientShareBalance { .. })
        ));
    }

    #[test]
    fn zeroed_balance_entry_removed() {
        let mut vault = Vault::new();
        let d1 = DepositorId(1);
        vault.mint_shares(d1, Shares::new(100)).unwrap();
        assert_eq!(vault.depositor_count(), 1);

        vault.burn_shares(d1, Shares::new(100)).unwrap();
        assert_eq!(vault.depositor_count(), 0);
        assert_eq!(vault.share_balance(d1), Shares::ZERO);
        assert!(vault.shares_conserved());
    }

    #[test]
    fn apply_fund_is_all_or_nothing() {
        let mut vault = Vault::new();
        let d1 = DepositorId(1);
        vault
            .apply_fund(d1, Quote::new(1_000_000), Shares::new(1_000_000))
            .unwrap();
        assert_eq!(vault.collateral(), Quote::new(1_000_000));
        assert_eq!(vault.total_shares(), Shares::new(1_000_000));
        assert!(vault.shares_conserved());

        // collateral overflow: neither leg applies
        let result = vault.apply_fund(d1, Quote::new(u64::MAX), Shares::new(1));
        assert!(matches!(result, Err(VaultError::Math(MathError::Overflow))));
        assert_eq!(vault.collateral(), Quote::new(1_000_000));
        assert_eq!(vault.total_shares(), Shares::new(1_000_000));
    }

    #[test]
    fn apply_withdraw_is_all_or_nothing() {
        let mut vault = Vault::new();
        let d1 = DepositorId(1);
        vault
            .apply_fund(d1, Quote::new(1_000_000), Shares::new(1_000_000))
            .unwrap();

        // payout exceeding collateral: rejected, nothing moves
        let result = vault.apply_withdraw(d1, Quote::new(2_000_000), Shares::new(500_000));
        assert!(matches!(
            result,
            Err(VaultError::InsufficientVaultBalance { .. })
        ));
        assert_eq!(vault.total_shares(), Shares::new(1_000_000));

        vault
            .apply_withdraw(d1, Quote::new(400_000), Shares::new(400_000))
            .unwrap();
        assert_eq!(vault.collateral(), Quote::new(600_000));
        assert_eq!(vault.share_balance(d1), Shares::new(600_000));
        assert!(vault.shares_conserved());
    }

    #[test]
    fn credit_overflow_detected() {
        let mut vault = Vault::new();
        vault.credit_collateral(Quote::new(u64::MAX)).unwrap();
        let result = vault.credit_collateral(Quote::new(1));
        assert!(matches!(result, Err(VaultError::Math(MathError::Overflow))));
    }
}
