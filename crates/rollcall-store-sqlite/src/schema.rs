//! SQL schema for the Rollcall SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Replaced wholesale on every import; rowid keeps import order.
CREATE TABLE IF NOT EXISTS subjects (
    id                  TEXT NOT NULL UNIQUE,
    scan_token          TEXT NOT NULL UNIQUE,
    name                TEXT NOT NULL,
    registration_number TEXT,
    email               TEXT NOT NULL,
    qr_code             TEXT
);

-- Append-only. Subject fields are copied in at mark time; scan_token refers
-- to subjects by value, not by foreign key.
CREATE TABLE IF NOT EXISTS attendance (
    scan_token          TEXT NOT NULL,
    subject_id          TEXT NOT NULL,
    name                TEXT NOT NULL,
    registration_number TEXT,
    email               TEXT NOT NULL,
    occurred_at         TEXT NOT NULL,   -- RFC 3339 UTC, fixed width
    day                 TEXT NOT NULL,   -- YYYY-MM-DD
    UNIQUE (scan_token, day)
);

CREATE INDEX IF NOT EXISTS attendance_day_idx ON attendance(day);

PRAGMA user_version = 1;
";
