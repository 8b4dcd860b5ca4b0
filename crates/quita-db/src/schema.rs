//! SQL schema definitions.

/// Complete schema for Quita v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Payable events
-- ============================================================

CREATE TABLE IF NOT EXISTS payable_events (
    event_id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    amount TEXT NOT NULL,
    lead_id INTEGER NOT NULL,
    sale_id INTEGER,
    referrer_id INTEGER,
    consultant_id INTEGER,
    status TEXT NOT NULL DEFAULT 'pending',
    paid_at INTEGER,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_status_kind ON payable_events(status, kind);
CREATE INDEX IF NOT EXISTS idx_events_consultant_paid ON payable_events(consultant_id, paid_at);
CREATE INDEX IF NOT EXISTS idx_events_referrer_paid ON payable_events(referrer_id, paid_at);

-- ============================================================
-- Commission ledger
-- ============================================================

-- UNIQUE (event_id, role_kind) is the idempotency contract: at most one
-- entry per source event and role kind, enforced by the storage engine.
CREATE TABLE IF NOT EXISTS commission_entries (
    entry_id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id INTEGER NOT NULL REFERENCES payable_events(event_id),
    role_kind TEXT NOT NULL,
    beneficiary_id INTEGER NOT NULL,
    amount TEXT NOT NULL,
    percentage TEXT NOT NULL,
    revenue_used TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'pending',
    computed_at INTEGER NOT NULL,
    paid_on INTEGER,
    notes TEXT NOT NULL DEFAULT '',
    UNIQUE (event_id, role_kind)
);

CREATE INDEX IF NOT EXISTS idx_entries_beneficiary ON commission_entries(beneficiary_id, computed_at);
CREATE INDEX IF NOT EXISTS idx_entries_status ON commission_entries(status, computed_at);
"#;
