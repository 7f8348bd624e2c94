//! The asset transfer rail — the host ledger's debit/credit primitive.
//!
//! The marketplace treats asset movement as an external collaborator: a
//! reliable, atomic transfer mechanism distinguishing the native currency
//! (value accompanies the call) from fungible tokens (payer must have
//! authorized the transfer in advance).

use std::collections::HashMap;

use openlend_types::{AccountId, Asset, OpenlendError, Result};
use rust_decimal::Decimal;

/// Host-ledger transfer primitive.
///
/// Operations execute under the serialized state-machine model: no other
/// mutation interleaves between a `check_transfer_in` and the matching
/// `transfer_in` within one marketplace operation. A successful check
/// therefore commits the rail to accepting the transfer, which is what
/// lets multi-lot deposits stay all-or-nothing without rollback.
pub trait AssetRail {
    /// Would `transfer_in` succeed right now?
    fn check_transfer_in(&self, from: AccountId, asset: &Asset, amount: Decimal) -> Result<()>;

    /// Debit `amount` of `asset` from `from`'s external balance into the
    /// marketplace's custody account.
    fn transfer_in(&mut self, from: AccountId, asset: &Asset, amount: Decimal) -> Result<()>;

    /// Credit `amount` of `asset` out of custody to `to`'s external
    /// balance.
    fn transfer_out(&mut self, to: AccountId, asset: &Asset, amount: Decimal) -> Result<()>;
}

/// In-memory reference rail.
///
/// Tracks external balances per (account, asset) and token allowances
/// granted to the marketplace. Native debits need only sufficient balance;
/// token debits additionally consume allowance, mirroring the
/// approve-then-transfer flow of token ledgers.
#[derive(Debug, Default)]
pub struct InMemoryRail {
    /// External balances per (account, asset).
    balances: HashMap<(AccountId, Asset), Decimal>,
    /// Remaining transfer authorization per (account, token asset).
    allowances: HashMap<(AccountId, Asset), Decimal>,
}

impl InMemoryRail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fund an account (external mint/deposit).
    pub fn credit(&mut self, account: AccountId, asset: &Asset, amount: Decimal) {
        *self
            .balances
            .entry((account, asset.clone()))
            .or_insert(Decimal::ZERO) += amount;
    }

    /// Authorize the marketplace to pull up to `amount` of a token from
    /// `owner`. Replaces any previous allowance.
    pub fn approve(&mut self, owner: AccountId, asset: &Asset, amount: Decimal) {
        self.allowances.insert((owner, asset.clone()), amount);
    }

    #[must_use]
    pub fn balance_of(&self, account: AccountId, asset: &Asset) -> Decimal {
        self.balances
            .get(&(account, asset.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn allowance_of(&self, owner: AccountId, asset: &Asset) -> Decimal {
        self.allowances
            .get(&(owner, asset.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

impl AssetRail for InMemoryRail {
    fn check_transfer_in(&self, from: AccountId, asset: &Asset, amount: Decimal) -> Result<()> {
        let available = self.balance_of(from, asset);
        if available < amount {
            return Err(OpenlendError::InsufficientFunds {
                asset: asset.clone(),
                needed: amount,
                available,
            });
        }
        if !asset.is_native() {
            let allowance = self.allowance_of(from, asset);
            if allowance < amount {
                return Err(OpenlendError::TransferRejected {
                    reason: format!(
                        "allowance for {asset} from {from} is {allowance}, need {amount}"
                    ),
                });
            }
        }
        Ok(())
    }

    fn transfer_in(&mut self, from: AccountId, asset: &Asset, amount: Decimal) -> Result<()> {
        self.check_transfer_in(from, asset, amount)?;
        *self
            .balances
            .entry((from, asset.clone()))
            .or_insert(Decimal::ZERO) -= amount;
        if !asset.is_native() {
            *self
                .allowances
                .entry((from, asset.clone()))
                .or_insert(Decimal::ZERO) -= amount;
        }
        Ok(())
    }

    fn transfer_out(&mut self, to: AccountId, asset: &Asset, amount: Decimal) -> Result<()> {
        self.credit(to, asset, amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usdc() -> Asset {
        Asset::token("USDC")
    }

    #[test]
    fn native_transfer_needs_only_balance() {
        let mut rail = InMemoryRail::new();
        let payer = AccountId::random();
        rail.credit(payer, &Asset::Native, Decimal::new(1000, 0));

        rail.transfer_in(payer, &Asset::Native, Decimal::new(400, 0))
            .unwrap();
        assert_eq!(rail.balance_of(payer, &Asset::Native), Decimal::new(600, 0));
    }

    #[test]
    fn native_transfer_fails_on_short_balance() {
        let mut rail = InMemoryRail::new();
        let payer = AccountId::random();
        rail.credit(payer, &Asset::Native, Decimal::new(100, 0));

        let err = rail
            .transfer_in(payer, &Asset::Native, Decimal::new(200, 0))
            .unwrap_err();
        assert!(matches!(err, OpenlendError::InsufficientFunds { .. }));
        // Nothing changed.
        assert_eq!(rail.balance_of(payer, &Asset::Native), Decimal::new(100, 0));
    }

    #[test]
    fn token_transfer_requires_allowance() {
        let mut rail = InMemoryRail::new();
        let payer = AccountId::random();
        rail.credit(payer, &usdc(), Decimal::new(1000, 0));

        let err = rail
            .transfer_in(payer, &usdc(), Decimal::new(100, 0))
            .unwrap_err();
        assert!(matches!(err, OpenlendError::TransferRejected { .. }));

        rail.approve(payer, &usdc(), Decimal::new(100, 0));
        rail.transfer_in(payer, &usdc(), Decimal::new(100, 0))
            .unwrap();
        assert_eq!(rail.balance_of(payer, &usdc()), Decimal::new(900, 0));
        assert_eq!(rail.allowance_of(payer, &usdc()), Decimal::ZERO);
    }

    #[test]
    fn allowance_is_consumed_not_reusable() {
        let mut rail = InMemoryRail::new();
        let payer = AccountId::random();
        rail.credit(payer, &usdc(), Decimal::new(1000, 0));
        rail.approve(payer, &usdc(), Decimal::new(150, 0));

        rail.transfer_in(payer, &usdc(), Decimal::new(100, 0))
            .unwrap();
        let err = rail
            .transfer_in(payer, &usdc(), Decimal::new(100, 0))
            .unwrap_err();
        assert!(matches!(err, OpenlendError::TransferRejected { .. }));
    }

    #[test]
    fn transfer_out_credits_payee() {
        let mut rail = InMemoryRail::new();
        let payee = AccountId::random();
        rail.transfer_out(payee, &usdc(), Decimal::new(250, 0))
            .unwrap();
        assert_eq!(rail.balance_of(payee, &usdc()), Decimal::new(250, 0));
    }

    #[test]
    fn check_matches_transfer_outcome() {
        let mut rail = InMemoryRail::new();
        let payer = AccountId::random();
        rail.credit(payer, &usdc(), Decimal::new(50, 0));
        rail.approve(payer, &usdc(), Decimal::new(50, 0));

        assert!(rail
            .check_transfer_in(payer, &usdc(), Decimal::new(50, 0))
            .is_ok());
        assert!(rail
            .check_transfer_in(payer, &usdc(), Decimal::new(51, 0))
            .is_err());
        rail.transfer_in(payer, &usdc(), Decimal::new(50, 0))
            .unwrap();
    }
}
