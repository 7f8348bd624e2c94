//! Custody conservation audit.
//!
//! Invariant checked after every lifecycle stage in tests (and available
//! to operators at any time):
//! ```text
//! ∀ asset: custody(asset) == Σ escrow of ACTIVE offers
//!                          + Σ collateral of outstanding loans
//! ```
//! "Outstanding" covers ACTIVE and REPAID loans: a repaid loan still holds
//! its collateral until the borrower-side claim pays it out.
//!
//! If this invariant ever breaks, value was created or destroyed somewhere
//! and the system must halt.

use std::collections::BTreeMap;

use openlend_types::{Asset, Loan, Offer, OpenlendError, Result};
use rust_decimal::Decimal;

use crate::custody::EscrowLedger;

/// Recompute expected custody totals from the offer and loan tables.
#[must_use]
pub fn expected_custody<'a>(
    offers: impl Iterator<Item = &'a Offer>,
    loans: impl Iterator<Item = &'a Loan>,
) -> BTreeMap<Asset, Decimal> {
    let mut expected: BTreeMap<Asset, Decimal> = BTreeMap::new();

    for offer in offers.filter(|offer| offer.is_active()) {
        for lot in offer.escrowed_lots() {
            *expected.entry(lot.asset).or_insert(Decimal::ZERO) += lot.amount;
        }
    }
    for loan in loans.filter(|loan| !loan.state.is_terminal()) {
        for lot in &loan.collateral {
            *expected.entry(lot.asset.clone()).or_insert(Decimal::ZERO) += lot.amount;
        }
    }
    expected
}

/// Compare the ledger's custody totals with the totals implied by the
/// offer and loan tables.
///
/// # Errors
/// Returns [`OpenlendError::CustodyInvariantViolation`] naming the first
/// asset whose totals disagree.
pub fn audit<'a>(
    ledger: &EscrowLedger,
    offers: impl Iterator<Item = &'a Offer>,
    loans: impl Iterator<Item = &'a Loan>,
) -> Result<()> {
    let expected = expected_custody(offers, loans);

    // Union of assets seen by either side, so stray custody is caught too.
    let mut assets: Vec<&Asset> = expected.keys().collect();
    for (asset, _) in ledger.totals() {
        if !expected.contains_key(asset) {
            assets.push(asset);
        }
    }

    for asset in assets {
        let want = expected.get(asset).copied().unwrap_or(Decimal::ZERO);
        let have = ledger.custody_of(asset);
        if want != have {
            return Err(OpenlendError::CustodyInvariantViolation {
                reason: format!("asset {asset}: ledger holds {have}, tables imply {want}"),
            });
        }
    }
    Ok(())
}
