//! The escrow ledger — per-asset custody totals.
//!
//! Deposits validate attached native value, precheck every rail transfer,
//! and only then move funds and credit custody, so a failed deposit leaves
//! no trace. Withdrawals debit custody before touching the rail; a custody
//! underflow (`InsufficientEscrow`) means a state-machine invariant was
//! already broken upstream.

use std::collections::BTreeMap;

use openlend_types::{
    aggregate_lots, native_portion, AccountId, Asset, CollateralLot, OpenlendError, Result,
};
use rust_decimal::Decimal;

use crate::rail::AssetRail;

/// Tracks how much of each asset the marketplace holds in custody.
#[derive(Debug, Default)]
pub struct EscrowLedger {
    /// Custody totals per asset.
    custody: BTreeMap<Asset, Decimal>,
}

impl EscrowLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a schedule of lots from `payer` into custody, atomically.
    ///
    /// `attached` is the native value accompanying the call; it must equal
    /// the native portion of the schedule exactly — over-payment is as
    /// invalid as under-payment.
    ///
    /// # Errors
    /// - `AmountMismatch` if `attached` disagrees with the native portion
    /// - `InsufficientFunds` / `TransferRejected` from the rail, in which
    ///   case nothing has moved
    pub fn deposit_lots(
        &mut self,
        rail: &mut impl AssetRail,
        payer: AccountId,
        lots: &[CollateralLot],
        attached: Decimal,
    ) -> Result<()> {
        let declared_native = native_portion(lots);
        if declared_native != attached {
            return Err(OpenlendError::AmountMismatch {
                declared: declared_native,
                supplied: attached,
            });
        }

        let totals = aggregate_lots(lots);

        // Precheck every transfer before executing any, so the whole
        // schedule moves or nothing does.
        for (asset, total) in &totals {
            rail.check_transfer_in(payer, asset, *total)?;
        }
        for (asset, total) in &totals {
            rail.transfer_in(payer, asset, *total)?;
            *self.custody.entry(asset.clone()).or_insert(Decimal::ZERO) += *total;
            tracing::debug!(payer = %payer, asset = %asset, amount = %total, "Escrow deposit");
        }
        Ok(())
    }

    /// Move a single amount from `payer` into custody.
    pub fn deposit(
        &mut self,
        rail: &mut impl AssetRail,
        payer: AccountId,
        asset: &Asset,
        amount: Decimal,
        attached: Decimal,
    ) -> Result<()> {
        self.deposit_lots(
            rail,
            payer,
            &[CollateralLot::new(asset.clone(), amount)],
            attached,
        )
    }

    /// Pay `amount` of `asset` out of custody to `payee`.
    ///
    /// # Errors
    /// `InsufficientEscrow` if custody cannot cover the payout. If the
    /// state-machine invariants hold this never fires; callers treat it as
    /// a fatal internal-consistency fault.
    pub fn withdraw(
        &mut self,
        rail: &mut impl AssetRail,
        payee: AccountId,
        asset: &Asset,
        amount: Decimal,
    ) -> Result<()> {
        match self.custody.get_mut(asset) {
            Some(held) if *held >= amount => *held -= amount,
            _ => {
                return Err(OpenlendError::InsufficientEscrow {
                    asset: asset.clone(),
                    needed: amount,
                    held: self.custody_of(asset),
                });
            }
        }
        rail.transfer_out(payee, asset, amount)?;
        tracing::debug!(payee = %payee, asset = %asset, amount = %amount, "Escrow withdrawal");
        Ok(())
    }

    /// Pay a whole lot schedule out of custody to `payee`.
    pub fn withdraw_lots(
        &mut self,
        rail: &mut impl AssetRail,
        payee: AccountId,
        lots: &[CollateralLot],
    ) -> Result<()> {
        for (asset, total) in aggregate_lots(lots) {
            self.withdraw(rail, payee, &asset, total)?;
        }
        Ok(())
    }

    /// Current custody total for an asset.
    #[must_use]
    pub fn custody_of(&self, asset: &Asset) -> Decimal {
        self.custody.get(asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Iterate custody totals (deterministic order).
    pub fn totals(&self) -> impl Iterator<Item = (&Asset, Decimal)> {
        self.custody.iter().map(|(asset, total)| (asset, *total))
    }
}
