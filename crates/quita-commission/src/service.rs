//! Per-event orchestration of evaluator and ledger.
//!
//! [`process_event`] is called explicitly from the unit of work that
//! marks a payable event paid, once per qualifying state transition. It
//! may be invoked again for the same transition (redelivered webhook,
//! backfill): the ledger existence check plus the storage-level
//! uniqueness constraint guarantee at most one entry per
//! (event, role kind), so reprocessing is a no-op.
//!
//! Failures are isolated per role kind: a configuration or persistence
//! failure while computing one kind is captured in that kind's slot and
//! never blocks sibling kinds of the same event.

use rusqlite::Connection;
use rust_decimal::Decimal;

use quita_db::queries::{entries, events, revenue};
use quita_db::DbError;
use quita_rates::CommissionConfig;
use quita_types::entry::{CommissionEntry, RoleKind};
use quita_types::events::PayableEvent;
use quita_types::EventId;

use crate::evaluate::{evaluate, Evaluation, SkipReason};
use crate::{CommissionError, Result};

/// The outcome of processing one (event, role kind) pair.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// A new ledger entry was written.
    Created(CommissionEntry),
    /// An entry already existed; idempotent no-op.
    SkippedDuplicate(CommissionEntry),
    /// No commission due under current policy.
    SkippedIneligible(SkipReason),
}

impl Outcome {
    /// The ledger entry this outcome refers to, where one exists.
    pub fn entry(&self) -> Option<&CommissionEntry> {
        match self {
            Outcome::Created(entry) | Outcome::SkippedDuplicate(entry) => Some(entry),
            Outcome::SkippedIneligible(_) => None,
        }
    }
}

/// Per-role-kind results of processing one event.
#[derive(Debug)]
pub struct EventOutcomes {
    pub event_id: EventId,
    pub results: Vec<(RoleKind, Result<Outcome>)>,
}

impl EventOutcomes {
    /// Number of entries created by this invocation.
    pub fn created_count(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, result)| matches!(result, Ok(Outcome::Created(_))))
            .count()
    }

    /// Number of role kinds that failed.
    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|(_, result)| result.is_err()).count()
    }

    /// The result slot for a role kind.
    pub fn result_for(&self, role_kind: RoleKind) -> Option<&Result<Outcome>> {
        self.results
            .iter()
            .find(|(kind, _)| *kind == role_kind)
            .map(|(_, result)| result)
    }

    /// The ledger entry for a role kind, whether created now or earlier.
    pub fn entry_for(&self, role_kind: RoleKind) -> Option<&CommissionEntry> {
        match self.result_for(role_kind) {
            Some(Ok(outcome)) => outcome.entry(),
            _ => None,
        }
    }
}

/// Process one paid event: for each applicable role kind, check the
/// ledger, evaluate the rule, and persist a `pending` entry.
///
/// # Errors
///
/// - [`CommissionError::EventNotFound`] when the event does not exist
/// - [`CommissionError::EventNotPaid`] when the event is not paid yet
/// - [`CommissionError::Persistence`] when the event or revenue reads
///   fail outright; per-role-kind failures are captured in the returned
///   [`EventOutcomes`] instead
pub fn process_event(
    conn: &Connection,
    config: &CommissionConfig,
    event_id: EventId,
) -> Result<EventOutcomes> {
    let event = match events::get(conn, event_id) {
        Ok(event) => event,
        Err(DbError::NotFound(_)) => return Err(CommissionError::EventNotFound(event_id)),
        Err(e) => return Err(e.into()),
    };
    if !event.is_paid() {
        return Err(CommissionError::EventNotPaid(event_id));
    }
    let paid_at = event.paid_at.ok_or(CommissionError::EventNotPaid(event_id))?;
    let window = revenue::MonthWindow::containing(paid_at)?;

    let mut results = Vec::new();
    for &role_kind in RoleKind::expected_for(event.kind) {
        let result = process_role_kind(conn, config, &event, role_kind, &window);
        if let Err(err) = &result {
            tracing::error!(
                event_id,
                role_kind = %role_kind,
                error = %err,
                "commission computation failed"
            );
        }
        results.push((role_kind, result));
    }

    Ok(EventOutcomes { event_id, results })
}

fn process_role_kind(
    conn: &Connection,
    config: &CommissionConfig,
    event: &PayableEvent,
    role_kind: RoleKind,
    window: &revenue::MonthWindow,
) -> Result<Outcome> {
    // Fast path: the ledger already has this pair.
    if let Some(existing) = entries::find(conn, event.id, role_kind)? {
        tracing::debug!(
            event_id = event.id,
            role_kind = %role_kind,
            entry_id = existing.id,
            "commission entry already exists, skipping"
        );
        return Ok(Outcome::SkippedDuplicate(existing));
    }

    let role = role_kind.role();
    let monthly_revenue = match event.role_holder(role) {
        Some(user_id) => revenue::monthly_revenue(conn, role, user_id, window)?,
        None => Decimal::ZERO,
    };

    let computation = match evaluate(event, role_kind, monthly_revenue, config)? {
        Evaluation::Ineligible(reason) => {
            tracing::info!(
                event_id = event.id,
                role_kind = %role_kind,
                reason = %reason,
                "commission skipped, event ineligible"
            );
            return Ok(Outcome::SkippedIneligible(reason));
        }
        Evaluation::Commission(computation) => computation,
    };

    let beneficiary_id = match event.role_holder(role) {
        Some(user_id) => user_id,
        // Unreachable: the evaluator skips on a missing role-holder.
        None => return Ok(Outcome::SkippedIneligible(SkipReason::NoRoleHolder)),
    };

    let notes = format!(
        "monthly revenue {} in payment month; {}% applied to {}",
        computation.revenue_used, computation.percentage, event.amount
    );
    let new_entry = entries::NewEntry {
        event_id: event.id,
        role_kind,
        beneficiary_id,
        amount: computation.amount,
        percentage: computation.percentage,
        revenue_used: computation.revenue_used,
        notes: &notes,
    };

    match entries::insert(conn, &new_entry, now_epoch()) {
        Ok(entry) => {
            tracing::info!(
                event_id = event.id,
                role_kind = %role_kind,
                entry_id = entry.id,
                amount = %entry.amount,
                percentage = %entry.percentage,
                "commission entry created"
            );
            Ok(Outcome::Created(entry))
        }
        // A concurrent writer inserted first; the uniqueness constraint
        // is the arbiter and this is the success path.
        Err(DbError::Duplicate(_)) => match entries::find(conn, event.id, role_kind)? {
            Some(existing) => {
                tracing::debug!(
                    event_id = event.id,
                    role_kind = %role_kind,
                    entry_id = existing.id,
                    "lost insert race, entry already present"
                );
                Ok(Outcome::SkippedDuplicate(existing))
            }
            None => Err(CommissionError::Persistence(DbError::NotFound(format!(
                "entry for event {} / {role_kind} vanished after conflict",
                event.id
            )))),
        },
        Err(e) => Err(e.into()),
    }
}

fn now_epoch() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or(0)
}
