//! Payable-event query functions.

use rusqlite::Connection;
use rust_decimal::Decimal;

use quita_types::events::{EventKind, EventStatus, PayableEvent};
use quita_types::{EventId, LeadId, SaleId, UserId};

use crate::{DbError, Result};

const EVENT_COLUMNS: &str =
    "event_id, kind, amount, lead_id, sale_id, referrer_id, consultant_id, status, paid_at";

/// Insert parameters for a new payable event.
#[derive(Clone, Debug)]
pub struct NewEvent {
    pub kind: EventKind,
    pub amount: Decimal,
    pub lead_id: LeadId,
    pub sale_id: Option<SaleId>,
    pub referrer_id: Option<UserId>,
    pub consultant_id: Option<UserId>,
}

/// Insert a payable event in the `pending` state.
pub fn insert(conn: &Connection, event: &NewEvent, created_at: i64) -> Result<EventId> {
    conn.execute(
        "INSERT INTO payable_events (kind, amount, lead_id, sale_id, referrer_id, consultant_id, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7)",
        rusqlite::params![
            event.kind.as_str(),
            event.amount.to_string(),
            event.lead_id,
            event.sale_id,
            event.referrer_id,
            event.consultant_id,
            created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch a payable event by id.
pub fn get(conn: &Connection, event_id: EventId) -> Result<PayableEvent> {
    conn.query_row(
        &format!("SELECT {EVENT_COLUMNS} FROM payable_events WHERE event_id = ?1"),
        [event_id],
        row_to_event,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("payable event {event_id}"))
        }
        other => DbError::Sqlite(other),
    })
}

/// Mark a pending event as paid at the given timestamp.
pub fn mark_paid(conn: &Connection, event_id: EventId, paid_at: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE payable_events SET status = 'paid', paid_at = ?1
         WHERE event_id = ?2 AND status = 'pending'",
        rusqlite::params![paid_at, event_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!(
            "payable event {event_id} not found or not pending"
        )));
    }
    Ok(())
}

/// Cancel a pending event.
pub fn cancel(conn: &Connection, event_id: EventId) -> Result<()> {
    let updated = conn.execute(
        "UPDATE payable_events SET status = 'cancelled'
         WHERE event_id = ?1 AND status = 'pending'",
        [event_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!(
            "payable event {event_id} not found or not pending"
        )));
    }
    Ok(())
}

/// All events currently in the paid state, oldest payment first.
pub fn paid_events(conn: &Connection) -> Result<Vec<PayableEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM payable_events WHERE status = 'paid' ORDER BY paid_at, event_id"
    ))?;
    let rows = stmt
        .query_map([], row_to_event)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All paid events of one kind, oldest payment first.
pub fn paid_events_by_kind(conn: &Connection, kind: EventKind) -> Result<Vec<PayableEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM payable_events
         WHERE status = 'paid' AND kind = ?1 ORDER BY paid_at, event_id"
    ))?;
    let rows = stmt
        .query_map([kind.as_str()], row_to_event)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<PayableEvent> {
    let kind_text: String = row.get(1)?;
    let kind =
        EventKind::parse(&kind_text).ok_or_else(|| crate::bad_code(1, &kind_text, "event kind"))?;
    let status_text: String = row.get(7)?;
    let status = EventStatus::parse(&status_text)
        .ok_or_else(|| crate::bad_code(7, &status_text, "event status"))?;
    Ok(PayableEvent {
        id: row.get(0)?,
        kind,
        amount: crate::decimal_col(row, 2)?,
        lead_id: row.get(3)?,
        sale_id: row.get(4)?,
        referrer_id: row.get(5)?,
        consultant_id: row.get(6)?,
        status,
        paid_at: row.get(8)?,
    })
}
