//! # openlend-book
//!
//! The offer book: create/cancel lifecycle for Lender Offers and Collateral
//! Offers, plus the Merkle whitelist gate restricting who may accept a
//! gated offer.
//!
//! ## Offer flow
//!
//! ```text
//! create_*_offer → escrow deposit → ACTIVE ─┬─ cancel_offer → refund → CANCELLED
//!                                           └─ (matching engine) → CONSUMED
//! ```
//!
//! Escrowed value equals the offer's declared amounts for as long as it is
//! ACTIVE; it is fully refunded on cancellation and fully moved into loan
//! custody on consumption. Ids are never reused; terminal offers stay in
//! the arena.

pub mod book;
pub mod whitelist;

pub use book::OfferBook;
