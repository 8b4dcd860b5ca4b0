//! Pure commission rule evaluation.
//!
//! Deterministic given the event, the role-holder's monthly revenue, and
//! the configuration; nothing here touches storage. Eligibility gates run
//! first, then the percentage is resolved and applied in full decimal
//! precision, rounding half-up to 2 decimal places as the final step.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use quita_rates::{round_money, CommissionConfig};
use quita_types::entry::{CommissionComputation, Role, RoleKind};
use quita_types::events::PayableEvent;

use crate::Result;

/// Why an (event, role kind) pair earns no commission.
///
/// These are informational skips under current policy, not errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The event has no holder for the role (e.g. a sale without referrer).
    NoRoleHolder,
    /// The event amount is zero or negative.
    NonPositiveAmount,
    /// Consultant monthly revenue is below the configured floor.
    BelowRevenueFloor,
    /// The resolved percentage is zero, so no entry is worth writing.
    ZeroPercentage,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoRoleHolder => "no_role_holder",
            SkipReason::NonPositiveAmount => "non_positive_amount",
            SkipReason::BelowRevenueFloor => "below_revenue_floor",
            SkipReason::ZeroPercentage => "zero_percentage",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluator verdict for one (event, role kind) pair.
#[derive(Clone, Debug, PartialEq)]
pub enum Evaluation {
    /// A commission is due.
    Commission(CommissionComputation),
    /// No commission under current policy.
    Ineligible(SkipReason),
}

impl Evaluation {
    pub fn is_commission(&self) -> bool {
        matches!(self, Evaluation::Commission(_))
    }
}

/// Evaluate the commission rule for one (event, role kind) pair.
///
/// `monthly_revenue` is the role-holder's trailing calendar-month revenue
/// at computation time, including the event being evaluated.
///
/// # Errors
///
/// - [`crate::CommissionError::Configuration`] when the rate table cannot
///   resolve a band for the revenue value
pub fn evaluate(
    event: &PayableEvent,
    role_kind: RoleKind,
    monthly_revenue: Decimal,
    config: &CommissionConfig,
) -> Result<Evaluation> {
    let role = role_kind.role();

    if event.role_holder(role).is_none() {
        return Ok(Evaluation::Ineligible(SkipReason::NoRoleHolder));
    }
    if event.amount <= Decimal::ZERO {
        return Ok(Evaluation::Ineligible(SkipReason::NonPositiveAmount));
    }
    if role == Role::Consultant && monthly_revenue < config.consultant_minimum_monthly_revenue {
        return Ok(Evaluation::Ineligible(SkipReason::BelowRevenueFloor));
    }

    let percentage = config.percentage_for(role, monthly_revenue)?;
    if percentage <= Decimal::ZERO {
        return Ok(Evaluation::Ineligible(SkipReason::ZeroPercentage));
    }

    let amount = round_money(event.amount * percentage / Decimal::ONE_HUNDRED);
    Ok(Evaluation::Commission(CommissionComputation {
        amount,
        percentage,
        revenue_used: monthly_revenue,
    }))
}
