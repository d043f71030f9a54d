use rusqlite::Connection;

// One row per accepted redemption; COUNT(*) per code is the usage counter.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS referral_redemptions (
    id                  TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    code_id             TEXT NOT NULL,              -- FK -> profile_referral_codes(id)
    redeemer_profile_id TEXT NOT NULL,              -- account UUID
    business_context_id TEXT NOT NULL,
    created_at          TEXT NOT NULL,              -- RFC-3339

    FOREIGN KEY (code_id) REFERENCES profile_referral_codes(id)
);

CREATE INDEX IF NOT EXISTS idx_redemptions_code ON referral_redemptions(code_id);
CREATE UNIQUE INDEX IF NOT EXISTS idx_redemptions_unique
    ON referral_redemptions(code_id, redeemer_profile_id, business_context_id);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
