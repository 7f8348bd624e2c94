//! The offer book: arena of posted offers plus the create/cancel
//! operations.
//!
//! Every state-changing operation takes the escrow ledger and the asset
//! rail explicitly — there is no global state. Creation escrows the
//! maker's side before the offer becomes visible; cancellation refunds it
//! in the same call that flips the state, so a refund can never be paid
//! twice.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use openlend_escrow::{AssetRail, EscrowLedger};
use openlend_types::{
    constants, AccountId, MarketplaceConfig, Offer, OfferId, OfferKind, OfferState, OfferTerms,
    OpenlendError, Result,
};
use rust_decimal::Decimal;

/// Arena of offers, keyed by monotonically assigned [`OfferId`].
#[derive(Debug)]
pub struct OfferBook {
    offers: BTreeMap<OfferId, Offer>,
    next_id: OfferId,
    config: MarketplaceConfig,
}

impl OfferBook {
    #[must_use]
    pub fn new(config: MarketplaceConfig) -> Self {
        Self {
            offers: BTreeMap::new(),
            next_id: OfferId(constants::FIRST_ID),
            config,
        }
    }

    // =================================================================
    // Creation
    // =================================================================

    /// Post a Lender Offer: escrow `terms.principal_amount` of the
    /// principal asset from `owner` and record the offer ACTIVE.
    ///
    /// `attached` is the native value accompanying the call; it must equal
    /// the principal amount exactly when the principal is native, and zero
    /// otherwise.
    pub fn create_lender_offer(
        &mut self,
        escrow: &mut EscrowLedger,
        rail: &mut impl AssetRail,
        owner: AccountId,
        terms: OfferTerms,
        attached: Decimal,
        now: DateTime<Utc>,
    ) -> Result<OfferId> {
        self.create_offer(escrow, rail, OfferKind::Lender, owner, terms, attached, now)
    }

    /// Post a Collateral Offer: escrow the full collateral schedule from
    /// `owner` and record the offer ACTIVE.
    ///
    /// `attached` must equal the native portion of the schedule exactly.
    pub fn create_collateral_offer(
        &mut self,
        escrow: &mut EscrowLedger,
        rail: &mut impl AssetRail,
        owner: AccountId,
        terms: OfferTerms,
        attached: Decimal,
        now: DateTime<Utc>,
    ) -> Result<OfferId> {
        self.create_offer(
            escrow,
            rail,
            OfferKind::Collateral,
            owner,
            terms,
            attached,
            now,
        )
    }

    fn create_offer(
        &mut self,
        escrow: &mut EscrowLedger,
        rail: &mut impl AssetRail,
        kind: OfferKind,
        owner: AccountId,
        terms: OfferTerms,
        attached: Decimal,
        now: DateTime<Utc>,
    ) -> Result<OfferId> {
        self.validate_terms(&terms)?;

        let offer = Offer {
            id: self.next_id,
            kind,
            owner,
            principal_asset: terms.principal_asset,
            principal_amount: terms.principal_amount,
            collateral: terms.collateral,
            repayment_premium: terms.repayment_premium,
            duration_secs: terms.duration_secs,
            gate: terms.gate,
            state: OfferState::Active,
            created_at: now,
        };

        // Escrow the maker's side first: a failed deposit leaves the book
        // untouched and the id counter unadvanced.
        escrow.deposit_lots(rail, owner, &offer.escrowed_lots(), attached)?;

        let id = offer.id;
        self.next_id = id.next();
        tracing::info!(
            offer = %id,
            kind = %offer.kind,
            owner = %owner,
            principal = %offer.principal_amount,
            asset = %offer.principal_asset,
            gated = !offer.gate.is_open(),
            "Offer created"
        );
        self.offers.insert(id, offer);
        Ok(id)
    }

    fn validate_terms(&self, terms: &OfferTerms) -> Result<()> {
        if terms.principal_amount <= Decimal::ZERO {
            return Err(OpenlendError::InvalidParameters {
                reason: format!("principal amount must be positive, got {}", terms.principal_amount),
            });
        }
        if terms.repayment_premium < Decimal::ZERO {
            return Err(OpenlendError::InvalidParameters {
                reason: format!(
                    "repayment premium must be non-negative, got {}",
                    terms.repayment_premium
                ),
            });
        }
        if terms.duration_secs <= 0 || terms.duration_secs > self.config.max_duration_secs {
            return Err(OpenlendError::InvalidParameters {
                reason: format!(
                    "duration must be in 1..={} seconds, got {}",
                    self.config.max_duration_secs, terms.duration_secs
                ),
            });
        }
        if terms.collateral.is_empty() || terms.collateral.len() > self.config.max_collateral_lots {
            return Err(OpenlendError::InvalidParameters {
                reason: format!(
                    "collateral schedule must name 1..={} lots, got {}",
                    self.config.max_collateral_lots,
                    terms.collateral.len()
                ),
            });
        }
        for lot in &terms.collateral {
            if lot.amount <= Decimal::ZERO {
                return Err(OpenlendError::InvalidParameters {
                    reason: format!("collateral amount must be positive, got {lot}"),
                });
            }
        }
        Ok(())
    }

    // =================================================================
    // Cancellation
    // =================================================================

    /// Cancel an ACTIVE offer and refund its full escrow to the owner.
    ///
    /// # Errors
    /// - `OfferNotFound` for an unknown id
    /// - `NotOfferOwner` unless `caller` created the offer
    /// - `OfferNotActive` if already cancelled or consumed — a second
    ///   cancel always fails cleanly and never double-refunds
    pub fn cancel_offer(
        &mut self,
        escrow: &mut EscrowLedger,
        rail: &mut impl AssetRail,
        id: OfferId,
        caller: AccountId,
    ) -> Result<()> {
        let offer = self
            .offers
            .get_mut(&id)
            .ok_or(OpenlendError::OfferNotFound(id))?;
        if offer.owner != caller {
            return Err(OpenlendError::NotOfferOwner(id));
        }
        if !offer.is_active() {
            return Err(OpenlendError::OfferNotActive(id));
        }

        // Flip the state before the refund: the withdraw cannot fail while
        // the custody invariant holds, and a re-entrant cancel would now
        // see a non-ACTIVE offer.
        offer.state = OfferState::Cancelled;
        let refund = offer.escrowed_lots();
        escrow.withdraw_lots(rail, caller, &refund)?;

        tracing::info!(offer = %id, owner = %caller, "Offer cancelled, escrow refunded");
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn get(&self, id: OfferId) -> Option<&Offer> {
        self.offers.get(&id)
    }

    /// Iterate all offers, including terminal ones (deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = &Offer> {
        self.offers.values()
    }

    /// Number of offers ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    /// Number of offers currently ACTIVE.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.offers.values().filter(|offer| offer.is_active()).count()
    }

    #[must_use]
    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    /// Load an ACTIVE offer of the expected kind, or fail the way the
    /// matching engine reports it.
    pub fn active_offer_of_kind(&self, id: OfferId, kind: OfferKind) -> Result<&Offer> {
        let offer = self.offers.get(&id).ok_or(OpenlendError::OfferNotFound(id))?;
        if offer.kind != kind {
            return Err(OpenlendError::InvalidParameters {
                reason: format!("{id} is a {} offer, expected {kind}", offer.kind),
            });
        }
        if !offer.is_active() {
            return Err(OpenlendError::OfferNotActive(id));
        }
        Ok(offer)
    }

    /// Mark an ACTIVE offer CONSUMED. Used by the matching engine as its
    /// first durable mutation, guaranteeing at-most-one acceptance.
    pub fn consume(&mut self, id: OfferId) -> Result<()> {
        let offer = self
            .offers
            .get_mut(&id)
            .ok_or(OpenlendError::OfferNotFound(id))?;
        if !offer.is_active() {
            return Err(OpenlendError::OfferNotActive(id));
        }
        offer.state = OfferState::Consumed;
        tracing::info!(offer = %id, "Offer consumed");
        Ok(())
    }
}

impl Default for OfferBook {
    fn default() -> Self {
        Self::new(MarketplaceConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openlend_escrow::InMemoryRail;
    use openlend_types::{Asset, CollateralLot, Gate};

    fn setup() -> (OfferBook, EscrowLedger, InMemoryRail) {
        (OfferBook::default(), EscrowLedger::new(), InMemoryRail::new())
    }

    fn funded(rail: &mut InMemoryRail) -> AccountId {
        let acct = AccountId::random();
        rail.credit(acct, &Asset::Native, Decimal::new(100_000, 0));
        acct
    }

    #[test]
    fn lender_offer_escrows_principal() {
        let (mut book, mut escrow, mut rail) = setup();
        let owner = funded(&mut rail);

        let id = book
            .create_lender_offer(
                &mut escrow,
                &mut rail,
                owner,
                OfferTerms::dummy_native(Decimal::new(1000, 0), Decimal::new(2000, 0)),
                Decimal::new(1000, 0),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(id, OfferId(1));
        assert_eq!(escrow.custody_of(&Asset::Native), Decimal::new(1000, 0));
        assert_eq!(
            rail.balance_of(owner, &Asset::Native),
            Decimal::new(99_000, 0)
        );
        assert_eq!(book.active_count(), 1);
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let (mut book, mut escrow, mut rail) = setup();
        let owner = funded(&mut rail);
        let terms = OfferTerms::dummy_native(Decimal::new(100, 0), Decimal::new(200, 0));

        let first = book
            .create_lender_offer(
                &mut escrow,
                &mut rail,
                owner,
                terms.clone(),
                Decimal::new(100, 0),
                Utc::now(),
            )
            .unwrap();
        book.cancel_offer(&mut escrow, &mut rail, first, owner)
            .unwrap();
        let second = book
            .create_lender_offer(
                &mut escrow,
                &mut rail,
                owner,
                terms,
                Decimal::new(100, 0),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(first, OfferId(1));
        assert_eq!(second, OfferId(2));
        // The cancelled record is retained.
        assert_eq!(book.get(first).unwrap().state, OfferState::Cancelled);
    }

    #[test]
    fn native_principal_requires_exact_attached_value() {
        let (mut book, mut escrow, mut rail) = setup();
        let owner = funded(&mut rail);
        let terms = OfferTerms::dummy_native(Decimal::new(1000, 0), Decimal::new(2000, 0));

        for wrong in [Decimal::ZERO, Decimal::new(900, 0), Decimal::new(1100, 0)] {
            let err = book
                .create_lender_offer(
                    &mut escrow,
                    &mut rail,
                    owner,
                    terms.clone(),
                    wrong,
                    Utc::now(),
                )
                .unwrap_err();
            assert!(matches!(err, OpenlendError::AmountMismatch { .. }));
        }
        assert!(book.is_empty());
        assert_eq!(escrow.custody_of(&Asset::Native), Decimal::ZERO);
    }

    #[test]
    fn collateral_offer_escrows_full_schedule() {
        let (mut book, mut escrow, mut rail) = setup();
        let owner = funded(&mut rail);
        let usdc = Asset::token("USDC");
        rail.credit(owner, &usdc, Decimal::new(10_000, 0));
        rail.approve(owner, &usdc, Decimal::new(10_000, 0));

        let terms = OfferTerms {
            principal_asset: usdc.clone(),
            principal_amount: Decimal::new(20_000, 0),
            collateral: vec![
                CollateralLot::new(Asset::Native, Decimal::new(10_000, 0)),
                CollateralLot::new(usdc.clone(), Decimal::new(10_000, 0)),
            ],
            repayment_premium: Decimal::new(2, 0),
            duration_secs: 8_640_000,
            gate: Gate::Open,
        };
        book.create_collateral_offer(
            &mut escrow,
            &mut rail,
            owner,
            terms,
            Decimal::new(10_000, 0),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(escrow.custody_of(&Asset::Native), Decimal::new(10_000, 0));
        assert_eq!(escrow.custody_of(&usdc), Decimal::new(10_000, 0));
    }

    #[test]
    fn invalid_terms_are_rejected() {
        let (mut book, mut escrow, mut rail) = setup();
        let owner = funded(&mut rail);
        let good = OfferTerms::dummy_native(Decimal::new(100, 0), Decimal::new(200, 0));

        let cases: Vec<OfferTerms> = vec![
            // Non-positive principal.
            OfferTerms {
                principal_amount: Decimal::ZERO,
                ..good.clone()
            },
            // Zero duration.
            OfferTerms {
                duration_secs: 0,
                ..good.clone()
            },
            // Negative premium.
            OfferTerms {
                repayment_premium: Decimal::NEGATIVE_ONE,
                ..good.clone()
            },
            // Empty collateral schedule.
            OfferTerms {
                collateral: vec![],
                ..good.clone()
            },
            // Zero-amount lot.
            OfferTerms {
                collateral: vec![CollateralLot::new(Asset::Native, Decimal::ZERO)],
                ..good.clone()
            },
        ];
        for terms in cases {
            let err = book
                .create_lender_offer(
                    &mut escrow,
                    &mut rail,
                    owner,
                    terms,
                    Decimal::new(100, 0),
                    Utc::now(),
                )
                .unwrap_err();
            assert!(matches!(err, OpenlendError::InvalidParameters { .. }));
        }
        assert!(book.is_empty());
    }

    #[test]
    fn cancel_refunds_exactly_once() {
        let (mut book, mut escrow, mut rail) = setup();
        let owner = funded(&mut rail);
        let id = book
            .create_lender_offer(
                &mut escrow,
                &mut rail,
                owner,
                OfferTerms::dummy_native(Decimal::new(1000, 0), Decimal::new(2000, 0)),
                Decimal::new(1000, 0),
                Utc::now(),
            )
            .unwrap();

        book.cancel_offer(&mut escrow, &mut rail, id, owner).unwrap();
        assert_eq!(
            rail.balance_of(owner, &Asset::Native),
            Decimal::new(100_000, 0)
        );
        assert_eq!(escrow.custody_of(&Asset::Native), Decimal::ZERO);

        let err = book
            .cancel_offer(&mut escrow, &mut rail, id, owner)
            .unwrap_err();
        assert!(matches!(err, OpenlendError::OfferNotActive(_)));
        // No double refund.
        assert_eq!(
            rail.balance_of(owner, &Asset::Native),
            Decimal::new(100_000, 0)
        );
    }

    #[test]
    fn only_owner_may_cancel() {
        let (mut book, mut escrow, mut rail) = setup();
        let owner = funded(&mut rail);
        let stranger = AccountId::random();
        let id = book
            .create_lender_offer(
                &mut escrow,
                &mut rail,
                owner,
                OfferTerms::dummy_native(Decimal::new(1000, 0), Decimal::new(2000, 0)),
                Decimal::new(1000, 0),
                Utc::now(),
            )
            .unwrap();

        let err = book
            .cancel_offer(&mut escrow, &mut rail, id, stranger)
            .unwrap_err();
        assert!(matches!(err, OpenlendError::NotOfferOwner(_)));
        assert!(book.get(id).unwrap().is_active());
    }

    #[test]
    fn consume_is_single_shot() {
        let (mut book, mut escrow, mut rail) = setup();
        let owner = funded(&mut rail);
        let id = book
            .create_lender_offer(
                &mut escrow,
                &mut rail,
                owner,
                OfferTerms::dummy_native(Decimal::new(1000, 0), Decimal::new(2000, 0)),
                Decimal::new(1000, 0),
                Utc::now(),
            )
            .unwrap();

        book.consume(id).unwrap();
        assert!(matches!(
            book.consume(id).unwrap_err(),
            OpenlendError::OfferNotActive(_)
        ));
        // Consumed offers cannot be cancelled either.
        assert!(matches!(
            book.cancel_offer(&mut escrow, &mut rail, id, owner)
                .unwrap_err(),
            OpenlendError::OfferNotActive(_)
        ));
    }

    #[test]
    fn unknown_offer_is_not_found() {
        let (mut book, mut escrow, mut rail) = setup();
        let caller = AccountId::random();
        let err = book
            .cancel_offer(&mut escrow, &mut rail, OfferId(99), caller)
            .unwrap_err();
        assert!(matches!(err, OpenlendError::OfferNotFound(_)));
    }
}
