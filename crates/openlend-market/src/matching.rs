//! Offer acceptance — the operations that originate loans.
//!
//! Both acceptance paths follow the same shape:
//! 1. Load the ACTIVE offer of the right kind
//! 2. Check the whitelist gate against the caller
//! 3. Escrow the acceptor's side (all fallible steps end here)
//! 4. Consume the offer — the first durable mutation, so an offer is
//!    accepted at most once and a loan only ever exists for a consumed
//!    offer
//! 5. Disburse the principal to the borrower
//! 6. Mint the two certificates and record the loan
//!
//! Steps 5–6 move custody the invariants guarantee is present; a failure
//! there is an internal-consistency fault, not a user error.

use chrono::{DateTime, Utc};
use openlend_book::whitelist::{self, ProofNode};
use openlend_escrow::AssetRail;
use openlend_types::{
    AccountId, Asset, CertificateRole, CollateralLot, Loan, LoanId, LoanState, OfferId, OfferKind,
    OpenlendError, Result,
};
use rust_decimal::Decimal;

use crate::marketplace::Marketplace;

impl Marketplace {
    /// Accept a Lender Offer: the caller becomes the borrower, pledging
    /// the offer's declared collateral schedule and receiving the
    /// principal immediately.
    ///
    /// # Errors
    /// - `OfferNotFound` / `OfferNotActive` / `InvalidParameters` on a
    ///   missing, consumed, cancelled, or wrong-kind offer
    /// - `NotWhitelisted` if the offer is gated and the proof fails
    /// - `AmountMismatch` / `InsufficientFunds` / `TransferRejected` if
    ///   the collateral cannot be escrowed — nothing is committed
    pub fn accept_lender_offer(
        &mut self,
        rail: &mut impl AssetRail,
        offer_id: OfferId,
        caller: AccountId,
        proof: &[ProofNode],
        attached: Decimal,
        now: DateTime<Utc>,
    ) -> Result<LoanId> {
        let offer = self.book.active_offer_of_kind(offer_id, OfferKind::Lender)?;
        if !whitelist::admits(&offer.gate, &caller, proof) {
            tracing::warn!(offer = %offer_id, caller = %caller, "Gated acceptance rejected");
            return Err(OpenlendError::NotWhitelisted(caller));
        }

        let lender = offer.owner;
        let collateral = offer.collateral.clone();
        let principal_asset = offer.principal_asset.clone();
        let principal_amount = offer.principal_amount;
        let repayment_amount = offer.repayment_amount();
        let deadline = now + offer.duration();

        // The borrower's collateral comes in before anything is committed.
        self.escrow.deposit_lots(rail, caller, &collateral, attached)?;

        // First durable mutation: the offer leaves ACTIVE.
        self.book.consume(offer_id)?;

        // Principal goes straight out of offer escrow to the borrower.
        self.escrow
            .withdraw(rail, caller, &principal_asset, principal_amount)?;

        self.record_loan(
            offer_id,
            lender,
            caller,
            principal_asset,
            principal_amount,
            repayment_amount,
            collateral,
            deadline,
            now,
        )
    }

    /// Accept a Collateral Offer: the caller becomes the lender, supplying
    /// the declared principal; the offer's owner is the borrower and
    /// receives it. The collateral escrowed at offer creation becomes the
    /// loan's collateral.
    pub fn accept_collateral_offer(
        &mut self,
        rail: &mut impl AssetRail,
        offer_id: OfferId,
        caller: AccountId,
        proof: &[ProofNode],
        attached: Decimal,
        now: DateTime<Utc>,
    ) -> Result<LoanId> {
        let offer = self
            .book
            .active_offer_of_kind(offer_id, OfferKind::Collateral)?;
        if !whitelist::admits(&offer.gate, &caller, proof) {
            tracing::warn!(offer = %offer_id, caller = %caller, "Gated acceptance rejected");
            return Err(OpenlendError::NotWhitelisted(caller));
        }

        let borrower = offer.owner;
        let collateral = offer.collateral.clone();
        let principal_asset = offer.principal_asset.clone();
        let principal_amount = offer.principal_amount;
        let repayment_amount = offer.repayment_amount();
        let deadline = now + offer.duration();

        // The lender's principal comes in before anything is committed.
        self.escrow.deposit_lots(
            rail,
            caller,
            &[CollateralLot::new(principal_asset.clone(), principal_amount)],
            attached,
        )?;

        // First durable mutation: the offer leaves ACTIVE.
        self.book.consume(offer_id)?;

        // Principal goes straight through to the borrower.
        self.escrow
            .withdraw(rail, borrower, &principal_asset, principal_amount)?;

        self.record_loan(
            offer_id,
            caller,
            borrower,
            principal_asset,
            principal_amount,
            repayment_amount,
            collateral,
            deadline,
            now,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn record_loan(
        &mut self,
        offer_id: OfferId,
        lender: AccountId,
        borrower: AccountId,
        principal_asset: Asset,
        principal_amount: Decimal,
        repayment_amount: Decimal,
        collateral: Vec<CollateralLot>,
        deadline: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<LoanId> {
        let loan_id = self.loans.allocate();
        let lender_certificate = self
            .registry
            .mint(lender, loan_id, CertificateRole::Lender);
        let borrower_certificate = self
            .registry
            .mint(borrower, loan_id, CertificateRole::Borrower);

        self.loans.insert(Loan {
            id: loan_id,
            offer_id,
            lender_certificate,
            borrower_certificate,
            principal_asset,
            principal_amount,
            repayment_amount,
            collateral,
            deadline,
            state: LoanState::Active,
            originated_at: now,
        });

        tracing::info!(
            loan = %loan_id,
            offer = %offer_id,
            lender = %lender,
            borrower = %borrower,
            principal = %principal_amount,
            deadline = %deadline,
            "Loan originated"
        );
        Ok(loan_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openlend_book::whitelist::{proof_for, whitelist_root};
    use openlend_escrow::InMemoryRail;
    use openlend_types::{Asset, Gate, OfferState, OfferTerms};

    fn setup() -> (Marketplace, InMemoryRail) {
        (Marketplace::default(), InMemoryRail::new())
    }

    fn funded(rail: &mut InMemoryRail) -> AccountId {
        let acct = AccountId::random();
        rail.credit(acct, &Asset::Native, Decimal::new(100_000, 0));
        acct
    }

    fn native_terms() -> OfferTerms {
        OfferTerms::dummy_native(Decimal::new(1000, 0), Decimal::new(2000, 0))
    }

    #[test]
    fn accept_lender_offer_originates_loan() {
        let (mut market, mut rail) = setup();
        let lender = funded(&mut rail);
        let borrower = funded(&mut rail);
        let now = Utc::now();

        let offer_id = market
            .create_lender_offer(&mut rail, lender, native_terms(), Decimal::new(1000, 0), now)
            .unwrap();
        let loan_id = market
            .accept_lender_offer(
                &mut rail,
                offer_id,
                borrower,
                &[],
                Decimal::new(2000, 0),
                now,
            )
            .unwrap();

        let loan = market.loan(loan_id).unwrap();
        assert_eq!(loan.state, LoanState::Active);
        assert_eq!(loan.deadline, now + chrono::Duration::seconds(86_400));
        assert_eq!(market.offer(offer_id).unwrap().state, OfferState::Consumed);

        // Borrower paid 2000 collateral, received 1000 principal.
        assert_eq!(
            rail.balance_of(borrower, &Asset::Native),
            Decimal::new(99_000, 0)
        );
        // Custody now holds exactly the collateral.
        assert_eq!(market.custody_of(&Asset::Native), Decimal::new(2000, 0));
        market.audit_custody().unwrap();

        // Certificates landed on the right parties.
        assert_eq!(
            market.certificate_holder(loan.lender_certificate).unwrap(),
            lender
        );
        assert_eq!(
            market
                .certificate_holder(loan.borrower_certificate)
                .unwrap(),
            borrower
        );
    }

    #[test]
    fn accept_collateral_offer_mirrors_roles() {
        let (mut market, mut rail) = setup();
        let borrower = funded(&mut rail);
        let lender = funded(&mut rail);
        let now = Utc::now();

        let offer_id = market
            .create_collateral_offer(
                &mut rail,
                borrower,
                native_terms(),
                Decimal::new(2000, 0),
                now,
            )
            .unwrap();
        let loan_id = market
            .accept_collateral_offer(
                &mut rail,
                offer_id,
                lender,
                &[],
                Decimal::new(1000, 0),
                now,
            )
            .unwrap();

        let loan = market.loan(loan_id).unwrap();
        // Borrower put up 2000 and got the 1000 principal.
        assert_eq!(
            rail.balance_of(borrower, &Asset::Native),
            Decimal::new(99_000, 0)
        );
        // Lender is out the principal.
        assert_eq!(
            rail.balance_of(lender, &Asset::Native),
            Decimal::new(99_000, 0)
        );
        assert_eq!(
            market.certificate_holder(loan.lender_certificate).unwrap(),
            lender
        );
        assert_eq!(
            market
                .certificate_holder(loan.borrower_certificate)
                .unwrap(),
            borrower
        );
        market.audit_custody().unwrap();
    }

    #[test]
    fn double_acceptance_fails() {
        let (mut market, mut rail) = setup();
        let lender = funded(&mut rail);
        let borrower = funded(&mut rail);
        let other = funded(&mut rail);
        let now = Utc::now();

        let offer_id = market
            .create_lender_offer(&mut rail, lender, native_terms(), Decimal::new(1000, 0), now)
            .unwrap();
        market
            .accept_lender_offer(
                &mut rail,
                offer_id,
                borrower,
                &[],
                Decimal::new(2000, 0),
                now,
            )
            .unwrap();

        let err = market
            .accept_lender_offer(&mut rail, offer_id, other, &[], Decimal::new(2000, 0), now)
            .unwrap_err();
        assert!(matches!(err, OpenlendError::OfferNotActive(_)));

        // A consumed offer cannot be cancelled either.
        let err = market.cancel_offer(&mut rail, offer_id, lender).unwrap_err();
        assert!(matches!(err, OpenlendError::OfferNotActive(_)));
    }

    #[test]
    fn failed_escrow_commits_nothing() {
        let (mut market, mut rail) = setup();
        let lender = funded(&mut rail);
        let poor = AccountId::random();
        rail.credit(poor, &Asset::Native, Decimal::new(2000, 0));
        let now = Utc::now();

        let offer_id = market
            .create_lender_offer(&mut rail, lender, native_terms(), Decimal::new(1000, 0), now)
            .unwrap();

        // Wrong attached value: AmountMismatch, offer stays ACTIVE.
        let err = market
            .accept_lender_offer(&mut rail, offer_id, poor, &[], Decimal::new(1999, 0), now)
            .unwrap_err();
        assert!(matches!(err, OpenlendError::AmountMismatch { .. }));
        assert!(market.offer(offer_id).unwrap().is_active());
        assert!(market.loans.is_empty());
        assert!(market.registry.is_empty());
        market.audit_custody().unwrap();
    }

    #[test]
    fn gated_offer_admits_only_members() {
        let (mut market, mut rail) = setup();
        let lender = funded(&mut rail);
        let member = funded(&mut rail);
        let outsider = funded(&mut rail);
        let now = Utc::now();

        let set = vec![member, AccountId::random(), AccountId::random()];
        let root = whitelist_root(&set).unwrap();
        let terms = OfferTerms {
            gate: Gate::Gated(root),
            ..native_terms()
        };
        let offer_id = market
            .create_lender_offer(&mut rail, lender, terms, Decimal::new(1000, 0), now)
            .unwrap();

        let member_proof = proof_for(&set, &member).unwrap();

        // Outsider, even with a member's proof: rejected.
        let err = market
            .accept_lender_offer(
                &mut rail,
                offer_id,
                outsider,
                &member_proof,
                Decimal::new(2000, 0),
                now,
            )
            .unwrap_err();
        assert!(matches!(err, OpenlendError::NotWhitelisted(_)));
        assert!(market.offer(offer_id).unwrap().is_active());

        // Member with the right proof: accepted.
        market
            .accept_lender_offer(
                &mut rail,
                offer_id,
                member,
                &member_proof,
                Decimal::new(2000, 0),
                now,
            )
            .unwrap();
        market.audit_custody().unwrap();
    }

    #[test]
    fn wrong_kind_offer_is_rejected() {
        let (mut market, mut rail) = setup();
        let owner = funded(&mut rail);
        let caller = funded(&mut rail);
        let now = Utc::now();

        let offer_id = market
            .create_collateral_offer(&mut rail, owner, native_terms(), Decimal::new(2000, 0), now)
            .unwrap();
        let err = market
            .accept_lender_offer(&mut rail, offer_id, caller, &[], Decimal::new(2000, 0), now)
            .unwrap_err();
        assert!(matches!(err, OpenlendError::InvalidParameters { .. }));
    }
}
