//! Error types for the OpenLend marketplace.
//!
//! All errors use the `OL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Offer errors
//! - 2xx: Escrow / transfer errors
//! - 3xx: Whitelist errors
//! - 4xx: Loan errors
//! - 5xx: Certificate errors
//! - 9xx: General / internal errors
//!
//! Every error is synchronous and non-retryable by the core itself: a failed
//! operation commits no state, and the caller must resubmit with corrected
//! parameters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, Asset, CertificateId, LoanId, OfferId};

/// Central error enum for all OpenLend operations.
#[derive(Debug, Error)]
pub enum OpenlendError {
    // =================================================================
    // Offer Errors (1xx)
    // =================================================================
    /// The requested offer was not found in the book.
    #[error("OL_ERR_100: Offer not found: {0}")]
    OfferNotFound(OfferId),

    /// Offer terms failed validation (non-positive amounts, mismatched
    /// sequence lengths, out-of-range duration, ...).
    #[error("OL_ERR_101: Invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    /// The offer is not ACTIVE (already cancelled or consumed).
    #[error("OL_ERR_102: Offer not active: {0}")]
    OfferNotActive(OfferId),

    /// Only the offer owner may cancel it.
    #[error("OL_ERR_103: Caller is not the owner of {0}")]
    NotOfferOwner(OfferId),

    /// Declared amount and attached native value disagree.
    #[error("OL_ERR_104: Amount mismatch: declared {declared}, supplied {supplied}")]
    AmountMismatch { declared: Decimal, supplied: Decimal },

    // =================================================================
    // Escrow / Transfer Errors (2xx)
    // =================================================================
    /// The payer's external balance cannot cover the transfer.
    #[error("OL_ERR_200: Insufficient funds in {asset}: need {needed}, have {available}")]
    InsufficientFunds {
        asset: Asset,
        needed: Decimal,
        available: Decimal,
    },

    /// The asset transfer mechanism refused the movement (e.g., missing
    /// or exhausted token allowance).
    #[error("OL_ERR_201: Transfer rejected: {reason}")]
    TransferRejected { reason: String },

    /// Custody underflow: the ledger holds less of an asset than a
    /// withdrawal requires. This can only happen if a state-machine
    /// invariant was broken — treat as a fatal internal-consistency fault,
    /// never as an ordinary user-facing error.
    #[error("OL_ERR_202: Insufficient escrow in {asset}: need {needed}, held {held}")]
    InsufficientEscrow {
        asset: Asset,
        needed: Decimal,
        held: Decimal,
    },

    /// Custody totals disagree with the offer/loan tables — critical
    /// safety alert.
    #[error("OL_ERR_203: Custody invariant violation: {reason}")]
    CustodyInvariantViolation { reason: String },

    // =================================================================
    // Whitelist Errors (3xx)
    // =================================================================
    /// The caller's Merkle proof does not place it in the offer's
    /// whitelist.
    #[error("OL_ERR_300: Account not whitelisted: {0}")]
    NotWhitelisted(AccountId),

    /// Structurally invalid proof material (wrong-length node, bad hex).
    /// A well-formed but non-matching proof is *not* an error; it simply
    /// fails verification.
    #[error("OL_ERR_301: Malformed whitelist proof: {reason}")]
    MalformedProof { reason: String },

    // =================================================================
    // Loan Errors (4xx)
    // =================================================================
    /// The requested loan was not found.
    #[error("OL_ERR_400: Loan not found: {0}")]
    LoanNotFound(LoanId),

    /// The loan is not ACTIVE (already repaid or claimed).
    #[error("OL_ERR_401: Loan not active: {0}")]
    LoanNotActive(LoanId),

    /// Caller does not hold the borrower certificate for this loan.
    #[error("OL_ERR_402: Caller does not hold the borrower certificate for {0}")]
    NotBorrowerCertificateHolder(LoanId),

    /// Caller does not hold the lender certificate for this loan.
    #[error("OL_ERR_403: Caller does not hold the lender certificate for {0}")]
    NotLenderCertificateHolder(LoanId),

    /// Borrower-side claim attempted before repayment.
    #[error("OL_ERR_404: Loan not repaid: {0}")]
    LoanNotRepaid(LoanId),

    /// Lender-side claim attempted before the deadline, or on a loan that
    /// was repaid in time.
    #[error("OL_ERR_405: Loan still current until {deadline}")]
    LoanStillCurrent { deadline: DateTime<Utc> },

    /// The loan's collateral was already disbursed by a claim.
    #[error("OL_ERR_406: Collateral already claimed for {0}")]
    AlreadyClaimed(LoanId),

    // =================================================================
    // Certificate Errors (5xx)
    // =================================================================
    /// The requested certificate was not found in the registry.
    #[error("OL_ERR_500: Certificate not found: {0}")]
    CertificateNotFound(CertificateId),

    /// Transfer attempted by an account that does not hold the
    /// certificate.
    #[error("OL_ERR_501: Caller does not hold certificate {0}")]
    NotCertificateHolder(CertificateId),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Configuration error (invalid limits, missing fields, etc.).
    #[error("OL_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenlendError>;
