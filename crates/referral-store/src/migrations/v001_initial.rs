//! v001 -- Initial schema creation.
//!
//! Creates `accounts`, the singleton `referral_rules` row with its append-only
//! `referral_rule_changes` audit log, and `profile_referral_codes`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Accounts (actor resolution)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID
    role       TEXT NOT NULL,                 -- 'admin' | 'user'
    created_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Referral rule (exactly one row, id = 1)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS referral_rules (
    id                  INTEGER PRIMARY KEY NOT NULL CHECK (id = 1),
    total_discount      INTEGER NOT NULL CHECK (total_discount >= 0),
    discount_type       TEXT NOT NULL,        -- 'fixed' | 'percentage'
    expired_days        INTEGER,              -- NULL = never expires
    max_discount        INTEGER NOT NULL CHECK (max_discount >= 0),
    max_usage           INTEGER,              -- NULL = unlimited
    reward_per_referral INTEGER NOT NULL CHECK (reward_per_referral >= 0),
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Rule audit log (append-only)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS referral_rule_changes (
    id                  TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    rule_id             INTEGER NOT NULL,
    changed_by          TEXT NOT NULL,              -- account UUID
    total_discount      INTEGER NOT NULL,
    discount_type       TEXT NOT NULL,
    expired_days        INTEGER,
    max_discount        INTEGER NOT NULL,
    max_usage           INTEGER,
    reward_per_referral INTEGER NOT NULL,
    created_at          TEXT NOT NULL,

    FOREIGN KEY (rule_id) REFERENCES referral_rules(id)
);

CREATE INDEX IF NOT EXISTS idx_rule_changes_created
    ON referral_rule_changes(created_at DESC);

-- ----------------------------------------------------------------
-- Referral codes (rule snapshot taken at issuance)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS profile_referral_codes (
    id                  TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    profile_id          TEXT NOT NULL,              -- account UUID
    code                TEXT NOT NULL,
    type                TEXT NOT NULL,              -- 'basic'
    is_active           INTEGER NOT NULL DEFAULT 1, -- boolean 0/1
    total_discount      INTEGER NOT NULL,
    discount_type       TEXT NOT NULL,
    expired_days        INTEGER,
    max_discount        INTEGER NOT NULL,
    max_usage           INTEGER,
    reward_per_referral INTEGER NOT NULL,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_referral_codes_code
    ON profile_referral_codes(code);
CREATE UNIQUE INDEX IF NOT EXISTS idx_referral_codes_profile_type
    ON profile_referral_codes(profile_id, type);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
