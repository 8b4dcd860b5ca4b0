//! Batch reconciliation: gap scan and backfill.
//!
//! The live path can miss entries (notification never delivered, policy
//! deployed after payments landed). The validator runs out-of-band,
//! enumerates every paid event system-wide, diffs expectations against
//! the ledger, and re-drives [`process_event`] over the gaps. Every
//! (event, role kind) pair is idempotent, so gaps are processed
//! independently, in no particular order, and a backfill run is safe
//! concurrently with live event processing.

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use quita_db::queries::{entries, events, revenue};
use quita_rates::CommissionConfig;
use quita_types::entry::RoleKind;
use quita_types::events::{EventKind, PayableEvent};
use quita_types::EventId;

use crate::evaluate::evaluate;
use crate::service::process_event;
use crate::Result;

/// A paid event missing one or more expected ledger entries.
#[derive(Clone, Debug, Serialize)]
pub struct Gap {
    pub event_id: EventId,
    pub amount: Decimal,
    pub paid_at: i64,
    /// Expected role kinds with no ledger entry.
    pub missing: Vec<RoleKind>,
}

/// Gap scan results, grouped by event category.
#[derive(Debug, Default, Serialize)]
pub struct GapReport {
    pub acquisition_fee: Vec<Gap>,
    pub down_payment: Vec<Gap>,
    pub installment: Vec<Gap>,
    /// Events the scan could not examine (each failure logged).
    pub errors: u32,
}

impl GapReport {
    /// Total number of missing (event, role kind) pairs.
    pub fn gap_count(&self) -> usize {
        self.categories()
            .iter()
            .flat_map(|gaps| gaps.iter())
            .map(|gap| gap.missing.len())
            .sum()
    }

    /// Whether the scan found nothing missing.
    pub fn is_empty(&self) -> bool {
        self.categories().iter().all(|gaps| gaps.is_empty())
    }

    fn categories(&self) -> [&Vec<Gap>; 3] {
        [&self.acquisition_fee, &self.down_payment, &self.installment]
    }

    fn category_mut(&mut self, kind: EventKind) -> &mut Vec<Gap> {
        match kind {
            EventKind::AcquisitionFee => &mut self.acquisition_fee,
            EventKind::DownPayment => &mut self.down_payment,
            EventKind::Installment => &mut self.installment,
        }
    }
}

/// Counts of entries created by a backfill run, per event category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BackfillStats {
    pub acquisition_fee_created: u32,
    pub down_payment_created: u32,
    pub installment_created: u32,
    /// Failures encountered; each is isolated, logged, and tallied.
    pub errors: u32,
}

impl BackfillStats {
    /// Total entries created across all categories.
    pub fn total_created(&self) -> u32 {
        self.acquisition_fee_created + self.down_payment_created + self.installment_created
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut u32 {
        match kind {
            EventKind::AcquisitionFee => &mut self.acquisition_fee_created,
            EventKind::DownPayment => &mut self.down_payment_created,
            EventKind::Installment => &mut self.installment_created,
        }
    }
}

/// Scan every paid event for missing ledger entries without creating
/// anything.
///
/// An expected (event, role kind) pair counts as a gap only when the
/// evaluator (dry-run) says a commission is due and no entry exists;
/// ineligible pairs are not gaps, so a clean ledger scans empty.
///
/// # Errors
///
/// - [`crate::CommissionError::Persistence`] when the event enumeration
///   itself fails; per-event failures are tallied in the report instead
pub fn scan_for_gaps(conn: &Connection, config: &CommissionConfig) -> Result<GapReport> {
    let paid = events::paid_events(conn)?;
    let mut report = GapReport::default();

    for event in &paid {
        match missing_kinds(conn, config, event) {
            Ok(missing) if missing.is_empty() => {}
            Ok(missing) => {
                let Some(paid_at) = event.paid_at else { continue };
                report.category_mut(event.kind).push(Gap {
                    event_id: event.id,
                    amount: event.amount,
                    paid_at,
                    missing,
                });
            }
            Err(err) => {
                tracing::error!(event_id = event.id, error = %err, "gap scan failed for event");
                report.errors += 1;
            }
        }
    }

    tracing::info!(
        scanned = paid.len(),
        gaps = report.gap_count(),
        errors = report.errors,
        "gap scan complete"
    );
    Ok(report)
}

fn missing_kinds(
    conn: &Connection,
    config: &CommissionConfig,
    event: &PayableEvent,
) -> Result<Vec<RoleKind>> {
    let Some(paid_at) = event.paid_at else {
        return Ok(Vec::new());
    };
    let window = revenue::MonthWindow::containing(paid_at)?;

    let mut missing = Vec::new();
    for &role_kind in RoleKind::expected_for(event.kind) {
        if entries::exists(conn, event.id, role_kind)? {
            continue;
        }
        let role = role_kind.role();
        let Some(user_id) = event.role_holder(role) else {
            continue;
        };
        let monthly_revenue = revenue::monthly_revenue(conn, role, user_id, &window)?;
        if evaluate(event, role_kind, monthly_revenue, config)?.is_commission() {
            missing.push(role_kind);
        }
    }
    Ok(missing)
}

/// Re-run [`process_event`] for every gap found by [`scan_for_gaps`],
/// tallying entries created per category.
///
/// Each failure is isolated, logged, and counted; the batch never aborts.
///
/// # Errors
///
/// - [`crate::CommissionError::Persistence`] when the initial scan fails
///   outright
pub fn backfill(conn: &Connection, config: &CommissionConfig) -> Result<BackfillStats> {
    let report = scan_for_gaps(conn, config)?;
    let mut stats = BackfillStats {
        errors: report.errors,
        ..BackfillStats::default()
    };

    let categories = [
        (EventKind::AcquisitionFee, &report.acquisition_fee),
        (EventKind::DownPayment, &report.down_payment),
        (EventKind::Installment, &report.installment),
    ];
    for (kind, gaps) in categories {
        for gap in gaps {
            match process_event(conn, config, gap.event_id) {
                Ok(outcomes) => {
                    *stats.slot_mut(kind) += outcomes.created_count() as u32;
                    stats.errors += outcomes.error_count() as u32;
                }
                Err(err) => {
                    tracing::error!(
                        event_id = gap.event_id,
                        error = %err,
                        "backfill failed for event"
                    );
                    stats.errors += 1;
                }
            }
        }
    }

    tracing::info!(
        created = stats.total_created(),
        errors = stats.errors,
        "backfill complete"
    );
    Ok(stats)
}
