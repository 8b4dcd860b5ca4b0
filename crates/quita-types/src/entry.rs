//! Roles, role kinds, and commission ledger entries.
//!
//! A [`CommissionEntry`] is the unit of record: at most one entry exists
//! per (source event, role kind) pair. Amount and percentage are captured
//! at computation time and never recomputed afterwards.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::events::EventKind;
use crate::{EntryId, EventId, UserId};

/// A commission-earning role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Originates a lead; paid a banded percentage of that lead's payments.
    Referrer,
    /// Closes and manages a sale; paid a fixed percentage of its payments.
    Consultant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Referrer => "referrer",
            Role::Consultant => "consultant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (role, transaction kind) pair a ledger entry is keyed by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    ReferrerAcquisitionFee,
    ReferrerDownPayment,
    ReferrerInstallment,
    ConsultantDownPayment,
    ConsultantInstallment,
}

impl RoleKind {
    /// All role kinds.
    pub const ALL: [RoleKind; 5] = [
        RoleKind::ReferrerAcquisitionFee,
        RoleKind::ReferrerDownPayment,
        RoleKind::ReferrerInstallment,
        RoleKind::ConsultantDownPayment,
        RoleKind::ConsultantInstallment,
    ];

    /// Stable storage code for this role kind.
    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::ReferrerAcquisitionFee => "referrer_acquisition_fee",
            RoleKind::ReferrerDownPayment => "referrer_down_payment",
            RoleKind::ReferrerInstallment => "referrer_installment",
            RoleKind::ConsultantDownPayment => "consultant_down_payment",
            RoleKind::ConsultantInstallment => "consultant_installment",
        }
    }

    /// Parse a storage code back into a role kind.
    pub fn parse(code: &str) -> Option<RoleKind> {
        match code {
            "referrer_acquisition_fee" => Some(RoleKind::ReferrerAcquisitionFee),
            "referrer_down_payment" => Some(RoleKind::ReferrerDownPayment),
            "referrer_installment" => Some(RoleKind::ReferrerInstallment),
            "consultant_down_payment" => Some(RoleKind::ConsultantDownPayment),
            "consultant_installment" => Some(RoleKind::ConsultantInstallment),
            _ => None,
        }
    }

    /// The role this kind pays.
    pub fn role(self) -> Role {
        match self {
            RoleKind::ReferrerAcquisitionFee
            | RoleKind::ReferrerDownPayment
            | RoleKind::ReferrerInstallment => Role::Referrer,
            RoleKind::ConsultantDownPayment | RoleKind::ConsultantInstallment => Role::Consultant,
        }
    }

    /// The role kinds a paid event of the given kind is expected to produce.
    pub fn expected_for(kind: EventKind) -> &'static [RoleKind] {
        match kind {
            EventKind::AcquisitionFee => &[RoleKind::ReferrerAcquisitionFee],
            EventKind::DownPayment => {
                &[RoleKind::ReferrerDownPayment, RoleKind::ConsultantDownPayment]
            }
            EventKind::Installment => {
                &[RoleKind::ReferrerInstallment, RoleKind::ConsultantInstallment]
            }
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrative lifecycle status of a ledger entry.
///
/// Entries are created `pending`; marking them `paid` or `cancelled` is an
/// administrative act and never re-triggers computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Pending,
    Paid,
    Cancelled,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Paid => "paid",
            EntryStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(code: &str) -> Option<EntryStatus> {
        match code {
            "pending" => Some(EntryStatus::Pending),
            "paid" => Some(EntryStatus::Paid),
            "cancelled" => Some(EntryStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The evaluator's output for one (event, role kind) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommissionComputation {
    /// Commission amount, rounded half-up to 2 decimal places.
    pub amount: Decimal,
    /// The percentage applied.
    pub percentage: Decimal,
    /// The trailing calendar-month revenue the percentage was resolved from.
    pub revenue_used: Decimal,
}

/// A persisted commission record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommissionEntry {
    pub id: EntryId,
    pub event_id: EventId,
    pub role_kind: RoleKind,
    pub beneficiary_id: UserId,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub revenue_used: Decimal,
    pub status: EntryStatus,
    /// Unix epoch seconds at computation time.
    pub computed_at: i64,
    /// Unix epoch seconds of the administrative payout, if paid.
    pub paid_on: Option<i64>,
    /// Free-text audit trail of the inputs used in computation.
    pub notes: String,
}
