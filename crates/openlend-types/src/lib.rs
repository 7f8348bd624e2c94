//! # openlend-types
//!
//! Shared types, errors, and configuration for the **OpenLend** peer-to-peer
//! collateralized loan marketplace.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OfferId`], [`LoanId`], [`CertificateId`], [`AccountId`]
//! - **Asset model**: [`Asset`], [`CollateralLot`]
//! - **Offer model**: [`Offer`], [`OfferKind`], [`OfferState`], [`OfferTerms`], [`Gate`], [`WhitelistRoot`]
//! - **Loan model**: [`Loan`], [`LoanState`]
//! - **Certificate model**: [`Certificate`], [`CertificateRole`]
//! - **Configuration**: [`MarketplaceConfig`]
//! - **Errors**: [`OpenlendError`] with `OL_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod asset;
pub mod certificate;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod loan;
pub mod offer;

// Re-export all primary types at crate root for ergonomic imports:
//   use openlend_types::{Offer, Loan, Asset, AccountId, ...};

pub use asset::*;
pub use certificate::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use loan::*;
pub use offer::*;

// Constants are accessed via `openlend_types::constants::FOO`
// (not re-exported to avoid name collisions).
