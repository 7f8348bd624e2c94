//! # openlend-escrow
//!
//! Custody of assets held by the marketplace on behalf of offer makers and
//! active loans.
//!
//! ## Architecture
//!
//! 1. **`AssetRail`**: the host ledger's transfer primitive, modeled as a
//!    trait. The marketplace never touches external balances directly.
//! 2. **`InMemoryRail`**: reference rail with per-(account, asset) balances
//!    and token allowances, for tests and simulation.
//! 3. **`EscrowLedger`**: per-asset custody totals. Every value movement in
//!    the offer book, matching engine, and loan lifecycle routes through
//!    `deposit_lots` / `withdraw` so that at all times
//!    `custody = Σ active offers' escrow + Σ outstanding loans' collateral`.
//! 4. **`conservation`**: recomputes that sum from the offer/loan tables
//!    and flags any disagreement with the ledger.

pub mod conservation;
pub mod custody;
pub mod rail;

pub use custody::EscrowLedger;
pub use rail::{AssetRail, InMemoryRail};
