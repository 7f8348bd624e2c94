//! Loan model: the joint position created when an offer is accepted.
//!
//! A loan is owned by two transferable certificates, not by addresses.
//! Its collateral is disbursed exactly once, to exactly one party, via one
//! of the two claim transitions.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Asset, CertificateId, CollateralLot, LoanId, OfferId};

/// Lifecycle state of a loan.
///
/// `Active → Repaid → BorrowerClaimed` is the happy path;
/// `Active → LenderClaimed` is the default path, gated by the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanState {
    /// Principal disbursed, collateral in custody, debt outstanding.
    Active,
    /// Debt settled; collateral awaits the borrower-side claim.
    Repaid,
    /// Collateral returned to the borrower-certificate holder. Terminal.
    BorrowerClaimed,
    /// Collateral seized by the lender-certificate holder. Terminal.
    LenderClaimed,
}

impl LoanState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::BorrowerClaimed | Self::LenderClaimed)
    }
}

impl fmt::Display for LoanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Repaid => write!(f, "REPAID"),
            Self::BorrowerClaimed => write!(f, "BORROWER_CLAIMED"),
            Self::LenderClaimed => write!(f, "LENDER_CLAIMED"),
        }
    }
}

/// An originated loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    /// The offer this loan was matched from (audit provenance).
    pub offer_id: OfferId,
    /// Certificate conferring the right to repayment proceeds and, on
    /// default, the collateral.
    pub lender_certificate: CertificateId,
    /// Certificate conferring the right to repay and reclaim collateral.
    pub borrower_certificate: CertificateId,
    pub principal_asset: Asset,
    pub principal_amount: Decimal,
    /// Total owed, fixed at match time. Always >= principal.
    pub repayment_amount: Decimal,
    /// Collateral lots held in loan custody.
    pub collateral: Vec<CollateralLot>,
    /// Absolute time after which an unpaid loan is claimable by the
    /// lender-certificate holder.
    pub deadline: DateTime<Utc>,
    pub state: LoanState,
    pub originated_at: DateTime<Utc>,
}

impl Loan {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == LoanState::Active
    }

    /// Whether the lender-side claim is currently permitted.
    ///
    /// Repayment removes default permanently; the deadline alone does not
    /// end the borrower's ability to repay (claim eligibility, not
    /// repayment, is deadline-gated).
    #[must_use]
    pub fn in_default(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline && self.state != LoanState::Repaid
    }
}
