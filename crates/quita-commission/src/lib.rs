//! # quita-commission
//!
//! Commission evaluation, event processing, and batch reconciliation.
//!
//! The live path is [`service::process_event`], called from the unit of
//! work that marks a payable event paid. The out-of-band path is
//! [`validator::scan_for_gaps`] and [`validator::backfill`], which catch
//! entries the live path missed. Both lean on the same correctness
//! mechanism: the storage-level uniqueness constraint on
//! (event, role kind).
//!
//! ## Modules
//!
//! - [`evaluate`] — Pure commission rule evaluation
//! - [`service`] — Per-event orchestration of evaluator and ledger
//! - [`validator`] — Gap scan and backfill over the whole ledger

pub mod evaluate;
pub mod service;
pub mod validator;

use quita_types::EventId;

/// Error types for commission processing.
#[derive(Debug, thiserror::Error)]
pub enum CommissionError {
    /// A required rate, band, or threshold is missing or malformed.
    /// Fatal for the single computation attempted.
    #[error("configuration error: {0}")]
    Configuration(#[from] quita_rates::RateError),

    /// Underlying storage failure.
    #[error("persistence error: {0}")]
    Persistence(#[from] quita_db::DbError),

    /// The referenced payable event does not exist.
    #[error("payable event {0} not found")]
    EventNotFound(EventId),

    /// `process_event` requires the event already persisted as paid;
    /// the calendar-month revenue aggregate must include it.
    #[error("payable event {0} is not in a paid state")]
    EventNotPaid(EventId),
}

/// Convenience result type for commission operations.
pub type Result<T> = std::result::Result<T, CommissionError>;
