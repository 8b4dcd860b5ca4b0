//! Revenue bands and the validated rate table.
//!
//! A band `[minimum_revenue, maximum_revenue)` maps a trailing
//! calendar-month revenue to a commission percentage. The lower bound is
//! inclusive and the upper bound exclusive, so a revenue value exactly on
//! a boundary belongs to the higher band. A validated table tiles the
//! whole of `[0, ∞)`: exactly one band matches any non-negative revenue.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::{RateError, Result};

/// One percentage tier keyed by monthly revenue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevenueBand {
    /// Inclusive lower revenue bound.
    pub minimum_revenue: Decimal,
    /// Exclusive upper revenue bound; `None` means unbounded.
    pub maximum_revenue: Option<Decimal>,
    /// Percentage applied to the whole transaction amount.
    pub percentage: Decimal,
}

impl RevenueBand {
    /// Whether the revenue value falls inside this band.
    pub fn contains(&self, revenue: Decimal) -> bool {
        revenue >= self.minimum_revenue
            && self.maximum_revenue.map_or(true, |maximum| revenue < maximum)
    }
}

/// An ordered set of revenue bands.
///
/// Deserializing a table does not validate it; [`RateTable::validate`]
/// must run before lookups are trusted (config loading does this).
/// [`RateTable::new`] validates eagerly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    bands: Vec<RevenueBand>,
}

impl RateTable {
    /// Build a validated table from bands ordered by `minimum_revenue`.
    ///
    /// # Errors
    ///
    /// Any [`RateError`] validation failure; see [`RateTable::validate`].
    pub fn new(bands: Vec<RevenueBand>) -> Result<Self> {
        let table = Self { bands };
        table.validate()?;
        Ok(table)
    }

    /// The bands, in ascending revenue order.
    pub fn bands(&self) -> &[RevenueBand] {
        &self.bands
    }

    /// Check that the bands tile `[0, ∞)` exactly once.
    ///
    /// # Errors
    ///
    /// - [`RateError::EmptyTable`] when no bands are configured
    /// - [`RateError::FirstBandNotZero`] when coverage starts above 0
    /// - [`RateError::OutOfOrder`] / [`RateError::NotContiguous`] on
    ///   unsorted, overlapping, or gapped bands
    /// - [`RateError::EmptyBand`] when a band's range is empty
    /// - [`RateError::UnboundedNotLast`] / [`RateError::BoundedTail`] when
    ///   the unbounded tail is missing or misplaced
    /// - [`RateError::NegativePercentage`] on a negative percentage
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.bands.first() else {
            return Err(RateError::EmptyTable);
        };
        if first.minimum_revenue != Decimal::ZERO {
            return Err(RateError::FirstBandNotZero {
                minimum: first.minimum_revenue,
            });
        }

        for (index, band) in self.bands.iter().enumerate() {
            if band.percentage < Decimal::ZERO {
                return Err(RateError::NegativePercentage {
                    minimum: band.minimum_revenue,
                    percentage: band.percentage,
                });
            }

            match band.maximum_revenue {
                Some(maximum) if maximum <= band.minimum_revenue => {
                    return Err(RateError::EmptyBand {
                        index,
                        minimum: band.minimum_revenue,
                        maximum,
                    });
                }
                Some(_) => {}
                None if index + 1 != self.bands.len() => {
                    return Err(RateError::UnboundedNotLast { index });
                }
                None => {}
            }

            if index > 0 {
                let previous = &self.bands[index - 1];
                if band.minimum_revenue <= previous.minimum_revenue {
                    return Err(RateError::OutOfOrder {
                        index,
                        previous: previous.minimum_revenue,
                        minimum: band.minimum_revenue,
                    });
                }
                match previous.maximum_revenue {
                    Some(expected) if expected != band.minimum_revenue => {
                        return Err(RateError::NotContiguous {
                            index,
                            expected,
                            minimum: band.minimum_revenue,
                        });
                    }
                    Some(_) => {}
                    // Unreachable for index > 0 after the UnboundedNotLast
                    // check, but kept total.
                    None => return Err(RateError::UnboundedNotLast { index: index - 1 }),
                }
            }
        }

        if let Some(last) = self.bands.last() {
            if let Some(maximum) = last.maximum_revenue {
                return Err(RateError::BoundedTail { maximum });
            }
        }

        Ok(())
    }

    /// Resolve the percentage for a monthly revenue value.
    ///
    /// # Errors
    ///
    /// - [`RateError::NegativeRevenue`] on a negative input
    /// - [`RateError::NoBandForRevenue`] when no band matches (only
    ///   reachable on a table that skipped validation)
    pub fn percentage_for(&self, revenue: Decimal) -> Result<Decimal> {
        if revenue < Decimal::ZERO {
            return Err(RateError::NegativeRevenue { revenue });
        }
        self.bands
            .iter()
            .find(|band| band.contains(revenue))
            .map(|band| band.percentage)
            .ok_or(RateError::NoBandForRevenue { revenue })
    }
}

/// Production referrer schedule: 2% under R$ 20k, climbing to 10% at R$ 60k+.
pub fn default_referrer_bands() -> RateTable {
    RateTable {
        bands: vec![
            band(dec!(0), Some(dec!(20000)), dec!(2.00)),
            band(dec!(20000), Some(dec!(30000)), dec!(3.00)),
            band(dec!(30000), Some(dec!(40000)), dec!(4.00)),
            band(dec!(40000), Some(dec!(50000)), dec!(5.00)),
            band(dec!(50000), Some(dec!(60000)), dec!(6.00)),
            band(dec!(60000), None, dec!(10.00)),
        ],
    }
}

fn band(minimum: Decimal, maximum: Option<Decimal>, percentage: Decimal) -> RevenueBand {
    RevenueBand {
        minimum_revenue: minimum,
        maximum_revenue: maximum,
        percentage,
    }
}
