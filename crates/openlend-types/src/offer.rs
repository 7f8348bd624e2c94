//! Offer model: posted lending terms awaiting a counterparty.
//!
//! Lender Offers and Collateral Offers share one shape ([`Offer`] with an
//! [`OfferKind`] discriminant). What differs is which side of the trade is
//! escrowed while the offer sits in the book: a Lender offer escrows its
//! principal, a Collateral offer escrows its pledged collateral schedule.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, Asset, CollateralLot, OfferId, OpenlendError, Result};

/// Which side of a loan the offer maker is taking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferKind {
    /// Maker lends the principal; acceptor pledges collateral.
    Lender,
    /// Maker pledges collateral; acceptor lends the principal.
    Collateral,
}

impl fmt::Display for OfferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lender => write!(f, "LENDER"),
            Self::Collateral => write!(f, "COLLATERAL"),
        }
    }
}

/// Lifecycle state of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferState {
    /// In the book, escrow held, acceptable and cancellable.
    Active,
    /// Cancelled by its owner; escrow refunded. Terminal.
    Cancelled,
    /// Accepted into a loan; escrow moved to loan custody. Terminal.
    Consumed,
}

impl fmt::Display for OfferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Consumed => write!(f, "CONSUMED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Whitelist gate
// ---------------------------------------------------------------------------

/// Merkle commitment to the set of accounts permitted to accept a gated
/// offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhitelistRoot(pub [u8; 32]);

impl WhitelistRoot {
    /// Parse a 32-byte root from hex (with or without `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| OpenlendError::InvalidParameters {
            reason: format!("whitelist root is not valid hex: {e}"),
        })?;
        let bytes: [u8; 32] =
            bytes
                .try_into()
                .map_err(|v: Vec<u8>| OpenlendError::InvalidParameters {
                    reason: format!("whitelist root must be 32 bytes, got {}", v.len()),
                })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for WhitelistRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Who may accept an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    /// Anyone may accept.
    Open,
    /// Only accounts whose Merkle proof verifies against the root.
    Gated(WhitelistRoot),
}

impl Gate {
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

// ---------------------------------------------------------------------------
// Offer
// ---------------------------------------------------------------------------

/// The maker-supplied terms of an offer, shared by both kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferTerms {
    /// Asset being lent.
    pub principal_asset: Asset,
    /// Amount being lent. Must be strictly positive.
    pub principal_amount: Decimal,
    /// Collateral schedule: pledged lots for a Collateral offer, required
    /// lots for a Lender offer. Non-empty, strictly positive amounts.
    pub collateral: Vec<CollateralLot>,
    /// Added to the principal to form the total owed at repayment.
    pub repayment_premium: Decimal,
    /// Time span after matching before the loan's deadline.
    pub duration_secs: i64,
    /// Whitelist gating of acceptance.
    pub gate: Gate,
}

/// A posted offer, as persisted in the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub kind: OfferKind,
    /// Creator; receives refunds and holds cancellation rights.
    pub owner: AccountId,
    pub principal_asset: Asset,
    pub principal_amount: Decimal,
    pub collateral: Vec<CollateralLot>,
    pub repayment_premium: Decimal,
    pub duration_secs: i64,
    pub gate: Gate,
    pub state: OfferState,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    /// Total owed at repayment: principal plus the fixed premium.
    #[must_use]
    pub fn repayment_amount(&self) -> Decimal {
        self.principal_amount + self.repayment_premium
    }

    /// Loan term as a chrono duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.duration_secs)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == OfferState::Active
    }

    /// The lots this offer keeps in escrow while ACTIVE: the principal for
    /// a Lender offer, the collateral schedule for a Collateral offer.
    #[must_use]
    pub fn escrowed_lots(&self) -> Vec<CollateralLot> {
        match self.kind {
            OfferKind::Lender => vec![CollateralLot::new(
                self.principal_asset.clone(),
                self.principal_amount,
            )],
            OfferKind::Collateral => self.collateral.clone(),
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl OfferTerms {
    /// Open, ungated terms: lend `principal_amount` native against a single
    /// native collateral lot.
    pub fn dummy_native(principal_amount: Decimal, collateral_amount: Decimal) -> Self {
        Self {
            principal_asset: Asset::Native,
            principal_amount,
            collateral: vec![CollateralLot::new(Asset::Native, collateral_amount)],
            repayment_premium: Decimal::ZERO,
            duration_secs: 86_400,
            gate: Gate::Open,
        }
    }
}
