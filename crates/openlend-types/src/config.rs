//! Configuration for a marketplace instance.

use serde::{Deserialize, Serialize};

use crate::{constants, OpenlendError, Result};

/// Limits applied when offers are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// Maximum collateral lots per offer.
    pub max_collateral_lots: usize,
    /// Maximum loan duration in seconds.
    pub max_duration_secs: i64,
}

impl MarketplaceConfig {
    /// Validate the configuration itself.
    pub fn validate(&self) -> Result<()> {
        if self.max_collateral_lots == 0 {
            return Err(OpenlendError::Configuration(
                "max_collateral_lots must be at least 1".into(),
            ));
        }
        if self.max_duration_secs <= 0 {
            return Err(OpenlendError::Configuration(
                "max_duration_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            max_collateral_lots: constants::DEFAULT_MAX_COLLATERAL_LOTS,
            max_duration_secs: constants::DEFAULT_MAX_DURATION_SECS,
        }
    }
}
