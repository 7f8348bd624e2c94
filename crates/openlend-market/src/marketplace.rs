//! The marketplace facade: one struct composing the offer book, escrow
//! ledger, loan table, and certificate registry.
//!
//! Operations take `&mut self` plus the external asset rail; the exclusive
//! borrow is what serializes the state machine — no two mutating
//! operations can observe or interleave with each other.

use chrono::{DateTime, Utc};
use openlend_book::OfferBook;
use openlend_escrow::{conservation, AssetRail, EscrowLedger};
use openlend_types::{
    AccountId, Asset, Certificate, CertificateId, Loan, LoanId, MarketplaceConfig, Offer, OfferId,
    OfferTerms, Result,
};
use rust_decimal::Decimal;

use crate::loans::LoanTable;
use crate::registry::CertificateRegistry;

/// A complete marketplace instance.
#[derive(Debug, Default)]
pub struct Marketplace {
    pub(crate) book: OfferBook,
    pub(crate) escrow: EscrowLedger,
    pub(crate) loans: LoanTable,
    pub(crate) registry: CertificateRegistry,
}

impl Marketplace {
    /// Build a marketplace with explicit limits.
    ///
    /// # Errors
    /// `Configuration` if the limits are invalid.
    pub fn new(config: MarketplaceConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            book: OfferBook::new(config),
            escrow: EscrowLedger::new(),
            loans: LoanTable::new(),
            registry: CertificateRegistry::new(),
        })
    }

    // =================================================================
    // Offer lifecycle (delegated to the book)
    // =================================================================

    /// Post a Lender Offer. See [`OfferBook::create_lender_offer`].
    pub fn create_lender_offer(
        &mut self,
        rail: &mut impl AssetRail,
        owner: AccountId,
        terms: OfferTerms,
        attached: Decimal,
        now: DateTime<Utc>,
    ) -> Result<OfferId> {
        self.book
            .create_lender_offer(&mut self.escrow, rail, owner, terms, attached, now)
    }

    /// Post a Collateral Offer. See [`OfferBook::create_collateral_offer`].
    pub fn create_collateral_offer(
        &mut self,
        rail: &mut impl AssetRail,
        owner: AccountId,
        terms: OfferTerms,
        attached: Decimal,
        now: DateTime<Utc>,
    ) -> Result<OfferId> {
        self.book
            .create_collateral_offer(&mut self.escrow, rail, owner, terms, attached, now)
    }

    /// Cancel an ACTIVE offer and refund its escrow.
    pub fn cancel_offer(
        &mut self,
        rail: &mut impl AssetRail,
        id: OfferId,
        caller: AccountId,
    ) -> Result<()> {
        self.book.cancel_offer(&mut self.escrow, rail, id, caller)
    }

    // =================================================================
    // Certificates
    // =================================================================

    /// Transfer an ownership certificate; repay/claim rights follow it.
    pub fn transfer_certificate(
        &mut self,
        id: CertificateId,
        from: AccountId,
        to: AccountId,
    ) -> Result<()> {
        self.registry.transfer(id, from, to)
    }

    pub fn certificate_holder(&self, id: CertificateId) -> Result<AccountId> {
        self.registry.holder_of(id)
    }

    #[must_use]
    pub fn certificate(&self, id: CertificateId) -> Option<&Certificate> {
        self.registry.get(id)
    }

    // =================================================================
    // Queries & audit
    // =================================================================

    #[must_use]
    pub fn offer(&self, id: OfferId) -> Option<&Offer> {
        self.book.get(id)
    }

    pub fn loan(&self, id: LoanId) -> Result<&Loan> {
        self.loans.get(id)
    }

    #[must_use]
    pub fn custody_of(&self, asset: &Asset) -> Decimal {
        self.escrow.custody_of(asset)
    }

    /// Verify the custody conservation invariant: the ledger's totals must
    /// equal the escrow implied by ACTIVE offers plus outstanding loans.
    pub fn audit_custody(&self) -> Result<()> {
        conservation::audit(&self.escrow, self.book.iter(), self.loans.iter())
    }
}
