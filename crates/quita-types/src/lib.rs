//! # quita-types
//!
//! Shared domain types used across the Quita workspace.
//!
//! ## Modules
//!
//! - [`events`] — Payable events (acquisition fees, down-payments, installments)
//! - [`entry`] — Roles, role kinds, and commission ledger entries

pub mod entry;
pub mod events;

/// Common identifier aliases.
///
/// Identifiers are plain relational row ids; resolution to display
/// identities lives in the user directory, outside this core.
pub type UserId = i64;
pub type LeadId = i64;
pub type SaleId = i64;
pub type EventId = i64;
pub type EntryId = i64;
