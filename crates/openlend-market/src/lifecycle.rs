//! Loan lifecycle — repayment and the two collateral claims.
//!
//! All three operations authorize through certificate possession, not
//! through the accounts that originally matched the loan. Repayment is the
//! one exception: anyone may pay a debt, but the proceeds always go to the
//! current lender-certificate holder.
//!
//! Collateral leaves custody exactly once per loan, through exactly one of
//! the two claims; the terminal state check runs before the holder check
//! so a stale claim reports `AlreadyClaimed` rather than a permission
//! error.

use chrono::{DateTime, Utc};
use openlend_escrow::AssetRail;
use openlend_types::{AccountId, LoanId, LoanState, OpenlendError, Result};
use rust_decimal::Decimal;

use crate::marketplace::Marketplace;

impl Marketplace {
    /// Settle a loan's debt. Open to any caller; the repayment goes to
    /// whoever currently holds the lender certificate.
    ///
    /// # Errors
    /// - `LoanNotFound` / `LoanNotActive` for a missing or settled loan
    /// - `AmountMismatch` / `InsufficientFunds` / `TransferRejected` if the
    ///   repayment cannot be collected — the loan stays ACTIVE
    pub fn pay_debt(
        &mut self,
        rail: &mut impl AssetRail,
        loan_id: LoanId,
        caller: AccountId,
        attached: Decimal,
    ) -> Result<()> {
        let loan = self.loans.get(loan_id)?;
        if !loan.is_active() {
            return Err(OpenlendError::LoanNotActive(loan_id));
        }
        let asset = loan.principal_asset.clone();
        let owed = loan.repayment_amount;
        let lender = self.registry.holder_of(loan.lender_certificate)?;

        // Collect the full repayment, then pass it straight through to the
        // lender-certificate holder.
        self.escrow.deposit(rail, caller, &asset, owed, attached)?;
        self.escrow.withdraw(rail, lender, &asset, owed)?;

        self.loans.get_mut(loan_id)?.state = LoanState::Repaid;
        tracing::info!(
            loan = %loan_id,
            payer = %caller,
            lender = %lender,
            amount = %owed,
            "Debt repaid"
        );
        Ok(())
    }

    /// Return a repaid loan's collateral to the borrower-certificate
    /// holder.
    ///
    /// # Errors
    /// - `AlreadyClaimed` if the collateral was already disbursed
    /// - `NotBorrowerCertificateHolder` unless the caller holds the
    ///   certificate
    /// - `LoanNotRepaid` while the debt is outstanding
    pub fn claim_collateral_as_borrower(
        &mut self,
        rail: &mut impl AssetRail,
        loan_id: LoanId,
        caller: AccountId,
    ) -> Result<()> {
        let loan = self.loans.get(loan_id)?;
        if loan.state.is_terminal() {
            return Err(OpenlendError::AlreadyClaimed(loan_id));
        }
        if !self.registry.is_held_by(loan.borrower_certificate, caller) {
            return Err(OpenlendError::NotBorrowerCertificateHolder(loan_id));
        }
        if loan.state != LoanState::Repaid {
            return Err(OpenlendError::LoanNotRepaid(loan_id));
        }
        let collateral = loan.collateral.clone();

        self.escrow.withdraw_lots(rail, caller, &collateral)?;
        self.loans.get_mut(loan_id)?.state = LoanState::BorrowerClaimed;
        tracing::info!(loan = %loan_id, claimant = %caller, "Collateral returned to borrower");
        Ok(())
    }

    /// Seize a defaulted loan's collateral for the lender-certificate
    /// holder. Permitted only once the deadline has passed with the debt
    /// unpaid; repayment removes eligibility permanently.
    ///
    /// # Errors
    /// - `AlreadyClaimed` if the collateral was already disbursed
    /// - `NotLenderCertificateHolder` unless the caller holds the
    ///   certificate
    /// - `LoanStillCurrent` before the deadline, or after an in-time
    ///   repayment
    pub fn claim_collateral_as_lender(
        &mut self,
        rail: &mut impl AssetRail,
        loan_id: LoanId,
        caller: AccountId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let loan = self.loans.get(loan_id)?;
        if loan.state.is_terminal() {
            return Err(OpenlendError::AlreadyClaimed(loan_id));
        }
        if !self.registry.is_held_by(loan.lender_certificate, caller) {
            return Err(OpenlendError::NotLenderCertificateHolder(loan_id));
        }
        if !loan.in_default(now) {
            return Err(OpenlendError::LoanStillCurrent {
                deadline: loan.deadline,
            });
        }
        let collateral = loan.collateral.clone();

        self.escrow.withdraw_lots(rail, caller, &collateral)?;
        self.loans.get_mut(loan_id)?.state = LoanState::LenderClaimed;
        tracing::info!(loan = %loan_id, claimant = %caller, "Collateral seized by lender");
        Ok(())
    }
}
