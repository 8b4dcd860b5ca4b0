//! Commission configuration.
//!
//! The configuration is an explicit value handed to the evaluator, never
//! ambient global state, so a historical computation can be reproduced by
//! replaying it against the configuration that was in force at the time.
//! Changing the configuration later must not alter entries already written.

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use quita_types::entry::Role;

use crate::bands::{default_referrer_bands, RateTable};
use crate::{RateError, Result};

/// Fixed consultant percentage applied to every qualifying payment.
pub const DEFAULT_CONSULTANT_PERCENTAGE: Decimal = dec!(3.00);

/// Monthly revenue a consultant must reach before earning commission.
pub const DEFAULT_CONSULTANT_REVENUE_FLOOR: Decimal = dec!(20000.00);

/// Complete commission policy configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommissionConfig {
    /// Banded percentage schedule for all referrer role kinds, keyed by
    /// the referrer's trailing calendar-month revenue.
    #[serde(default = "default_referrer_bands")]
    pub referrer_bands: RateTable,
    /// Fixed consultant percentage (no banding).
    #[serde(default = "default_consultant_percentage")]
    pub consultant_percentage: Decimal,
    /// Eligibility floor for consultant commissions, distinct from the
    /// percentage schedule: below it the consultant earns nothing.
    #[serde(default = "default_consultant_floor")]
    pub consultant_minimum_monthly_revenue: Decimal,
}

fn default_consultant_percentage() -> Decimal {
    DEFAULT_CONSULTANT_PERCENTAGE
}

fn default_consultant_floor() -> Decimal {
    DEFAULT_CONSULTANT_REVENUE_FLOOR
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            referrer_bands: default_referrer_bands(),
            consultant_percentage: DEFAULT_CONSULTANT_PERCENTAGE,
            consultant_minimum_monthly_revenue: DEFAULT_CONSULTANT_REVENUE_FLOOR,
        }
    }
}

impl CommissionConfig {
    /// Validate the whole configuration.
    ///
    /// # Errors
    ///
    /// - any band validation failure from [`RateTable::validate`]
    /// - [`RateError::InvalidConsultantPercentage`] outside `[0, 100]`
    /// - [`RateError::NegativeFloor`] on a negative eligibility floor
    pub fn validate(&self) -> Result<()> {
        self.referrer_bands.validate()?;
        if self.consultant_percentage < Decimal::ZERO
            || self.consultant_percentage > Decimal::ONE_HUNDRED
        {
            return Err(RateError::InvalidConsultantPercentage {
                percentage: self.consultant_percentage,
            });
        }
        if self.consultant_minimum_monthly_revenue < Decimal::ZERO {
            return Err(RateError::NegativeFloor {
                floor: self.consultant_minimum_monthly_revenue,
            });
        }
        Ok(())
    }

    /// Resolve the percentage for a role given its monthly revenue.
    ///
    /// Referrers are banded; consultants get the fixed percentage (the
    /// eligibility floor is the evaluator's concern, not this lookup's).
    ///
    /// # Errors
    ///
    /// - [`RateError::NegativeRevenue`] on a negative revenue
    /// - [`RateError::NoBandForRevenue`] from an unvalidated band table
    pub fn percentage_for(&self, role: Role, monthly_revenue: Decimal) -> Result<Decimal> {
        match role {
            Role::Referrer => self.referrer_bands.percentage_for(monthly_revenue),
            Role::Consultant => {
                if monthly_revenue < Decimal::ZERO {
                    return Err(RateError::NegativeRevenue {
                        revenue: monthly_revenue,
                    });
                }
                Ok(self.consultant_percentage)
            }
        }
    }

    /// Parse and validate a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// - [`RateError::Parse`] on malformed TOML
    /// - any validation failure from [`CommissionConfig::validate`]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        tracing::debug!(
            bands = config.referrer_bands.bands().len(),
            consultant_percentage = %config.consultant_percentage,
            "commission config loaded"
        );
        Ok(config)
    }

    /// Load and validate a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// - [`RateError::Io`] when the file cannot be read
    /// - everything [`CommissionConfig::from_toml_str`] can return
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
