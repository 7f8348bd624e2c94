//! # openlend-market
//!
//! The matching engine and loan lifecycle: the operations that turn a
//! posted offer into a live loan and drive that loan to a terminal state.
//!
//! ## Architecture
//!
//! 1. **`CertificateRegistry`**: mints and tracks the two bearer
//!    certificates per loan; possession is the sole authorization oracle
//!    for repay/claim rights.
//! 2. **`LoanTable`**: arena of originated loans.
//! 3. **`Marketplace`**: facade composing the offer book, escrow ledger,
//!    loan table, and registry. The asset rail stays external and is
//!    passed per call.
//!
//! ## Loan flow
//!
//! ```text
//! accept_*_offer → offer CONSUMED → principal disbursed → certificates minted
//!               → Loan ACTIVE ─┬─ pay_debt → REPAID → claim_as_borrower → BORROWER_CLAIMED
//!                              └─ (deadline passes)  → claim_as_lender   → LENDER_CLAIMED
//! ```
//!
//! Acceptance is all-or-nothing: every fallible step precedes the first
//! durable mutation, and the offer leaves ACTIVE before any loan state
//! exists, so an offer can be accepted at most once.

pub mod lifecycle;
pub mod loans;
pub mod marketplace;
pub mod matching;
pub mod registry;

pub use loans::LoanTable;
pub use marketplace::Marketplace;
pub use registry::CertificateRegistry;
