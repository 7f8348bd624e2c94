//! System-wide constants for the OpenLend marketplace.

/// Maximum number of collateral lots a single offer may declare.
///
/// The protocol itself handles any count; the cap keeps claim payouts and
/// conservation audits bounded per loan.
pub const DEFAULT_MAX_COLLATERAL_LOTS: usize = 4;

/// Maximum loan duration in seconds (10 years).
pub const DEFAULT_MAX_DURATION_SECS: i64 = 315_360_000;

/// First id issued by every arena (offers, loans, certificates).
pub const FIRST_ID: u64 = 1;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenLend";
