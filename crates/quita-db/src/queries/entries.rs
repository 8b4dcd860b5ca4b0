//! Commission-ledger query functions.
//!
//! The insert path maps a uniqueness conflict on (event_id, role_kind) to
//! [`DbError::Duplicate`]; two writers racing on the same pair leave
//! exactly one row, and the loser is told the entry already exists.

use rusqlite::Connection;
use rust_decimal::Decimal;

use quita_types::entry::{CommissionEntry, EntryStatus, RoleKind};
use quita_types::{EntryId, EventId, UserId};

use crate::{DbError, Result};

const ENTRY_COLUMNS: &str = "entry_id, event_id, role_kind, beneficiary_id, amount, percentage, \
                             revenue_used, status, computed_at, paid_on, notes";

/// Insert parameters for a new ledger entry.
#[derive(Clone, Debug)]
pub struct NewEntry<'a> {
    pub event_id: EventId,
    pub role_kind: RoleKind,
    pub beneficiary_id: UserId,
    pub amount: Decimal,
    pub percentage: Decimal,
    pub revenue_used: Decimal,
    pub notes: &'a str,
}

/// Insert a ledger entry in the `pending` state and return it.
///
/// # Errors
///
/// - [`DbError::Duplicate`] when an entry already exists for this
///   (event, role kind) pair
pub fn insert(conn: &Connection, entry: &NewEntry<'_>, computed_at: i64) -> Result<CommissionEntry> {
    let inserted = conn.execute(
        "INSERT INTO commission_entries
             (event_id, role_kind, beneficiary_id, amount, percentage, revenue_used, status, computed_at, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', ?7, ?8)",
        rusqlite::params![
            entry.event_id,
            entry.role_kind.as_str(),
            entry.beneficiary_id,
            entry.amount.to_string(),
            entry.percentage.to_string(),
            entry.revenue_used.to_string(),
            computed_at,
            entry.notes,
        ],
    );
    match inserted {
        Ok(_) => get(conn, conn.last_insert_rowid()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(DbError::Duplicate(format!(
                "commission entry for event {} / {}",
                entry.event_id, entry.role_kind
            )))
        }
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

/// Fetch a ledger entry by id.
pub fn get(conn: &Connection, entry_id: EntryId) -> Result<CommissionEntry> {
    conn.query_row(
        &format!("SELECT {ENTRY_COLUMNS} FROM commission_entries WHERE entry_id = ?1"),
        [entry_id],
        row_to_entry,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            DbError::NotFound(format!("commission entry {entry_id}"))
        }
        other => DbError::Sqlite(other),
    })
}

/// Find the entry for an (event, role kind) pair, if any.
pub fn find(
    conn: &Connection,
    event_id: EventId,
    role_kind: RoleKind,
) -> Result<Option<CommissionEntry>> {
    let result = conn.query_row(
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM commission_entries
             WHERE event_id = ?1 AND role_kind = ?2"
        ),
        rusqlite::params![event_id, role_kind.as_str()],
        row_to_entry,
    );
    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::Sqlite(e)),
    }
}

/// Whether an entry exists for an (event, role kind) pair.
pub fn exists(conn: &Connection, event_id: EventId, role_kind: RoleKind) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM commission_entries WHERE event_id = ?1 AND role_kind = ?2",
        rusqlite::params![event_id, role_kind.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Mark a pending entry as paid out.
pub fn mark_paid(conn: &Connection, entry_id: EntryId, paid_on: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE commission_entries SET status = 'paid', paid_on = ?1
         WHERE entry_id = ?2 AND status = 'pending'",
        rusqlite::params![paid_on, entry_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!(
            "commission entry {entry_id} not found or not pending"
        )));
    }
    Ok(())
}

/// Cancel a pending entry, recording the reason at the head of its notes.
///
/// Paid entries cannot be cancelled.
pub fn cancel(conn: &Connection, entry_id: EntryId, reason: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE commission_entries
         SET status = 'cancelled',
             notes = 'cancelled: ' || ?1 || char(10) || notes
         WHERE entry_id = ?2 AND status = 'pending'",
        rusqlite::params![reason, entry_id],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound(format!(
            "commission entry {entry_id} not found, already paid, or already cancelled"
        )));
    }
    Ok(())
}

/// Entries computed for a beneficiary inside `[from, until)`, oldest first.
pub fn for_beneficiary_in(
    conn: &Connection,
    beneficiary_id: UserId,
    from: i64,
    until: i64,
) -> Result<Vec<CommissionEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTRY_COLUMNS} FROM commission_entries
         WHERE beneficiary_id = ?1 AND computed_at >= ?2 AND computed_at < ?3
         ORDER BY computed_at, entry_id"
    ))?;
    let rows = stmt
        .query_map(rusqlite::params![beneficiary_id, from, until], row_to_entry)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Count and total for one entry status.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct StatusTotals {
    pub count: u32,
    pub total: Decimal,
}

/// Ledger totals per status.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct LedgerStats {
    pub pending: StatusTotals,
    pub paid: StatusTotals,
    pub cancelled: StatusTotals,
    pub overall: StatusTotals,
}

/// Aggregate the whole ledger into per-status counts and totals.
pub fn statistics(conn: &Connection) -> Result<LedgerStats> {
    let mut stmt = conn.prepare("SELECT status, amount FROM commission_entries")?;
    let rows = stmt
        .query_map([], |row| {
            let status: String = row.get(0)?;
            let amount = crate::decimal_col(row, 1)?;
            Ok((status, amount))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stats = LedgerStats::default();
    for (status_text, amount) in rows {
        let status = EntryStatus::parse(&status_text)
            .ok_or_else(|| DbError::Corrupt(format!("unknown entry status: {status_text:?}")))?;
        let slot = match status {
            EntryStatus::Pending => &mut stats.pending,
            EntryStatus::Paid => &mut stats.paid,
            EntryStatus::Cancelled => &mut stats.cancelled,
        };
        slot.count += 1;
        slot.total += amount;
        stats.overall.count += 1;
        stats.overall.total += amount;
    }
    Ok(stats)
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommissionEntry> {
    let kind_text: String = row.get(2)?;
    let role_kind =
        RoleKind::parse(&kind_text).ok_or_else(|| crate::bad_code(2, &kind_text, "role kind"))?;
    let status_text: String = row.get(7)?;
    let status = EntryStatus::parse(&status_text)
        .ok_or_else(|| crate::bad_code(7, &status_text, "entry status"))?;
    Ok(CommissionEntry {
        id: row.get(0)?,
        event_id: row.get(1)?,
        role_kind,
        beneficiary_id: row.get(3)?,
        amount: crate::decimal_col(row, 4)?,
        percentage: crate::decimal_col(row, 5)?,
        revenue_used: crate::decimal_col(row, 6)?,
        status,
        computed_at: row.get(8)?,
        paid_on: row.get(9)?,
        notes: row.get(10)?,
    })
}
