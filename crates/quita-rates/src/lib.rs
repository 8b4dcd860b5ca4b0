//! # quita-rates
//!
//! Revenue bands and commission rate configuration.
//!
//! Referrer commissions are banded: a referrer's trailing calendar-month
//! revenue selects a band, and the band reached applies retroactively to
//! the whole transaction (not incrementally per tier). Consultant
//! commissions use a fixed percentage gated by a minimum monthly revenue.
//!
//! ## Modules
//!
//! - [`bands`] — Revenue bands and the validated rate table
//! - [`config`] — The explicit commission configuration value

pub mod bands;
pub mod config;

pub use bands::{RateTable, RevenueBand};
pub use config::CommissionConfig;

use rust_decimal::{Decimal, RoundingStrategy};

/// Error types for rate configuration and lookup.
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    /// The rate table has no bands at all.
    #[error("rate table has no bands configured")]
    EmptyTable,

    /// Coverage must start at zero revenue.
    #[error("first band must start at revenue 0, got {minimum}")]
    FirstBandNotZero {
        /// The first band's minimum revenue.
        minimum: Decimal,
    },

    /// Band minima must be strictly increasing.
    #[error("band {index} out of order: minimum {minimum} after {previous}")]
    OutOfOrder {
        index: usize,
        previous: Decimal,
        minimum: Decimal,
    },

    /// Bands must tile `[0, ∞)` with no gap or overlap.
    #[error("band {index} breaks coverage: previous band ends at {expected}, this one starts at {minimum}")]
    NotContiguous {
        index: usize,
        expected: Decimal,
        minimum: Decimal,
    },

    /// A band's maximum must exceed its minimum.
    #[error("band {index} has an empty range: [{minimum}, {maximum})")]
    EmptyBand {
        index: usize,
        minimum: Decimal,
        maximum: Decimal,
    },

    /// Only the final band may be unbounded.
    #[error("band {index} is unbounded but is not the last band")]
    UnboundedNotLast { index: usize },

    /// The final band must be unbounded so every revenue value matches.
    #[error("last band must be unbounded, got maximum {maximum}")]
    BoundedTail { maximum: Decimal },

    /// Percentages below zero are never valid.
    #[error("negative percentage {percentage} in band starting at {minimum}")]
    NegativePercentage {
        minimum: Decimal,
        percentage: Decimal,
    },

    /// No configured band matches the revenue value.
    #[error("no revenue band matches revenue {revenue}")]
    NoBandForRevenue { revenue: Decimal },

    /// Revenue aggregates are sums of payments and cannot be negative.
    #[error("negative monthly revenue {revenue}")]
    NegativeRevenue { revenue: Decimal },

    /// The fixed consultant percentage is outside `[0, 100]`.
    #[error("consultant percentage {percentage} is not a valid rate")]
    InvalidConsultantPercentage { percentage: Decimal },

    /// The consultant eligibility floor cannot be negative.
    #[error("consultant minimum monthly revenue {floor} is negative")]
    NegativeFloor { floor: Decimal },

    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Convenience result type for rate operations.
pub type Result<T> = std::result::Result<T, RateError>;

/// Round a monetary amount half-up to 2 decimal places.
///
/// This is the single rounding point of the engine: commission math is
/// carried out in full decimal precision and rounded only here.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec!(37.035)), dec!(37.04));
        assert_eq!(round_money(dec!(0.125)), dec!(0.13));
        assert_eq!(round_money(dec!(9.9999)), dec!(10.00));
        assert_eq!(round_money(dec!(20.004)), dec!(20.00));
    }

    #[test]
    fn test_round_money_exact_values_unchanged() {
        assert_eq!(round_money(dec!(20.00)), dec!(20.00));
        assert_eq!(round_money(dec!(0)), dec!(0));
    }
}
