//! Payable events.
//!
//! A payable event is a transaction that can trigger commission once it
//! reaches the `paid` state: a lead acquisition fee, a sale down-payment,
//! or a later installment of a sale.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entry::Role;
use crate::{EventId, LeadId, SaleId, UserId};

/// The kind of transaction an event represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Lead acquisition fee (the up-front fee a lead pays for intake).
    AcquisitionFee,
    /// The initial payment of a sale.
    DownPayment,
    /// A later installment of a sale.
    Installment,
}

impl EventKind {
    /// All event kinds, in scan order.
    pub const ALL: [EventKind; 3] = [
        EventKind::AcquisitionFee,
        EventKind::DownPayment,
        EventKind::Installment,
    ];

    /// Stable storage code for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::AcquisitionFee => "acquisition_fee",
            EventKind::DownPayment => "down_payment",
            EventKind::Installment => "installment",
        }
    }

    /// Parse a storage code back into a kind.
    pub fn parse(code: &str) -> Option<EventKind> {
        match code {
            "acquisition_fee" => Some(EventKind::AcquisitionFee),
            "down_payment" => Some(EventKind::DownPayment),
            "installment" => Some(EventKind::Installment),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment lifecycle status of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Paid,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Paid => "paid",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(code: &str) -> Option<EventStatus> {
        match code {
            "pending" => Some(EventStatus::Pending),
            "paid" => Some(EventStatus::Paid),
            "cancelled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transaction that can trigger commission.
///
/// `referrer_id` is optional for every kind (a sale may have no referrer);
/// `consultant_id` is set on sale-derived events and absent on acquisition
/// fees. `paid_at` is Unix epoch seconds, set when the event reaches the
/// `paid` state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PayableEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub amount: Decimal,
    pub lead_id: LeadId,
    pub sale_id: Option<SaleId>,
    pub referrer_id: Option<UserId>,
    pub consultant_id: Option<UserId>,
    pub status: EventStatus,
    pub paid_at: Option<i64>,
}

impl PayableEvent {
    pub fn is_paid(&self) -> bool {
        self.status == EventStatus::Paid
    }

    /// The event's role-holder for the given role, if any.
    pub fn role_holder(&self, role: Role) -> Option<UserId> {
        match role {
            Role::Referrer => self.referrer_id,
            Role::Consultant => self.consultant_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_event_kind_codes_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::parse("boleto"), None);
    }

    #[test]
    fn test_event_status_codes_round_trip() {
        for status in [EventStatus::Pending, EventStatus::Paid, EventStatus::Cancelled] {
            assert_eq!(EventStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EventStatus::parse("open"), None);
    }

    #[test]
    fn test_role_holder_lookup() {
        let event = PayableEvent {
            id: 1,
            kind: EventKind::DownPayment,
            amount: dec!(1000.00),
            lead_id: 7,
            sale_id: Some(3),
            referrer_id: None,
            consultant_id: Some(42),
            status: EventStatus::Paid,
            paid_at: Some(1_700_000_000),
        };
        assert_eq!(event.role_holder(Role::Referrer), None);
        assert_eq!(event.role_holder(Role::Consultant), Some(42));
        assert!(event.is_paid());
    }
}
