//! Ownership certificates: bearer-transferable claims on a loan.
//!
//! Possession is the sole authorization oracle for repay/claim operations.
//! Rights follow whoever currently holds the certificate, not the party
//! that originally made or accepted the offer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AccountId, CertificateId, LoanId};

/// Which side of the loan a certificate represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateRole {
    /// Right to repayment proceeds, and to the collateral on default.
    Lender,
    /// Right to repay the debt and reclaim the collateral.
    Borrower,
}

impl fmt::Display for CertificateRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lender => write!(f, "LENDER"),
            Self::Borrower => write!(f, "BORROWER"),
        }
    }
}

/// A minted certificate. Exactly one exists per (loan, role), held by
/// exactly one account at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub loan: LoanId,
    pub role: CertificateRole,
    /// Current holder. Updated on transfer.
    pub holder: AccountId,
}
