//! Asset model: the distinguished native asset vs. fungible tokens, and
//! collateral lots.
//!
//! Native transfers must carry their value with the call; token transfers
//! require prior authorization on the rail. The distinction matters for
//! the `AmountMismatch` checks in the escrow ledger.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fungible asset on the host ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Asset {
    /// The host ledger's native currency. Moving it into custody requires
    /// the exact amount to accompany the call as attached value.
    Native,
    /// A fungible token identified by symbol (e.g., "USDC"). Moving it
    /// requires a prior allowance granted by the payer.
    Token(String),
}

impl Asset {
    #[must_use]
    pub fn token(symbol: impl Into<String>) -> Self {
        Self::Token(symbol.into())
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "NATIVE"),
            Self::Token(symbol) => write!(f, "tok:{symbol}"),
        }
    }
}

/// A single (asset, amount) pledge within a collateral schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralLot {
    pub asset: Asset,
    pub amount: Decimal,
}

impl CollateralLot {
    #[must_use]
    pub fn new(asset: Asset, amount: Decimal) -> Self {
        Self { asset, amount }
    }
}

impl fmt::Display for CollateralLot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset)
    }
}

/// Sum lot amounts per asset, preserving first-seen order.
///
/// A schedule may legitimately name the same asset twice; transfers
/// operate on the aggregated totals so the whole schedule moves or
/// nothing does.
#[must_use]
pub fn aggregate_lots(lots: &[CollateralLot]) -> Vec<(Asset, Decimal)> {
    let mut totals: Vec<(Asset, Decimal)> = Vec::with_capacity(lots.len());
    for lot in lots {
        match totals.iter_mut().find(|(asset, _)| *asset == lot.asset) {
            Some((_, total)) => *total += lot.amount,
            None => totals.push((lot.asset.clone(), lot.amount)),
        }
    }
    totals
}

/// Total native value in a lot set. This is the attached value a caller
/// must supply when escrowing the schedule.
#[must_use]
pub fn native_portion(lots: &[CollateralLot]) -> Decimal {
    lots.iter()
        .filter(|lot| lot.asset.is_native())
        .map(|lot| lot.amount)
        .sum()
}
