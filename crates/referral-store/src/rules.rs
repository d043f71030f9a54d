//! Singleton rule row and its audit log.

use referral_shared::constants::RULE_SINGLETON_ID;
use referral_shared::context::Context;
use referral_shared::types::{AccountId, RuleParams};
use rusqlite::{params, OptionalExtension};

use crate::database::{commit, Database};
use crate::error::Result;
use crate::models::{ReferralRule, ReferralRuleChange};
use crate::repository::RuleStore;
use crate::row::{account_at, now, params_at, timestamp_at, ts, uuid_at};

const RULE_COLUMNS: &str = "id, total_discount, discount_type, expired_days, max_discount, \
                            max_usage, reward_per_referral, created_at, updated_at";

impl RuleStore for Database {
    fn read_rule(&self, ctx: &Context) -> Result<ReferralRule> {
        ctx.check()?;
        Ok(self.conn().query_row(
            &format!("SELECT {RULE_COLUMNS} FROM referral_rules WHERE id = ?1"),
            params![RULE_SINGLETON_ID],
            row_to_rule,
        )?)
    }

    fn init_rule(&self, ctx: &Context, defaults: &RuleParams) -> Result<ReferralRule> {
        self.prepare_write(ctx)?;
        let stamp = ts(&now());
        let inserted = self.conn().execute(
            "INSERT INTO referral_rules
                 (id, total_discount, discount_type, expired_days, max_discount,
                  max_usage, reward_per_referral, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             ON CONFLICT(id) DO NOTHING",
            params![
                RULE_SINGLETON_ID,
                defaults.total_discount,
                defaults.discount_type.as_str(),
                defaults.expired_days,
                defaults.max_discount,
                defaults.max_usage,
                defaults.reward_per_referral,
                stamp,
            ],
        )?;
        if inserted > 0 {
            tracing::info!("initialized referral rule with defaults");
        }
        self.read_rule(ctx)
    }

    fn upsert_rule_audited(
        &self,
        ctx: &Context,
        changed_by: AccountId,
        params: &RuleParams,
    ) -> Result<Option<(ReferralRule, ReferralRuleChange)>> {
        let tx = self.begin_immediate(ctx)?;

        // Compare under the write lock so concurrent identical submissions
        // produce one write and one audit row.
        let current = tx
            .query_row(
                &format!("SELECT {RULE_COLUMNS} FROM referral_rules WHERE id = ?1"),
                params![RULE_SINGLETON_ID],
                row_to_rule,
            )
            .optional()?;
        if matches!(&current, Some(rule) if rule.params == *params) {
            tracing::debug!("referral rule already holds these values");
            return Ok(None);
        }

        ctx.check()?;
        let stamp = ts(&now());

        let rule = tx.query_row(
            &format!(
                "INSERT INTO referral_rules
                     (id, total_discount, discount_type, expired_days, max_discount,
                      max_usage, reward_per_referral, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                     total_discount      = excluded.total_discount,
                     discount_type       = excluded.discount_type,
                     expired_days        = excluded.expired_days,
                     max_discount        = excluded.max_discount,
                     max_usage           = excluded.max_usage,
                     reward_per_referral = excluded.reward_per_referral,
                     updated_at          = excluded.updated_at
                 RETURNING {RULE_COLUMNS}"
            ),
            params![
                RULE_SINGLETON_ID,
                params.total_discount,
                params.discount_type.as_str(),
                params.expired_days,
                params.max_discount,
                params.max_usage,
                params.reward_per_referral,
                stamp,
            ],
            row_to_rule,
        )?;

        ctx.check()?;
        let change = ReferralRuleChange::snapshot_of(&rule, changed_by);
        tx.execute(
            "INSERT INTO referral_rule_changes
                 (id, rule_id, changed_by, total_discount, discount_type, expired_days,
                  max_discount, max_usage, reward_per_referral, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                change.id.to_string(),
                change.rule_id,
                change.changed_by.to_string(),
                change.params.total_discount,
                change.params.discount_type.as_str(),
                change.params.expired_days,
                change.params.max_discount,
                change.params.max_usage,
                change.params.reward_per_referral,
                ts(&change.created_at),
            ],
        )?;

        commit(ctx, tx)?;
        Ok(Some((rule, change)))
    }

    fn list_rule_changes(
        &self,
        ctx: &Context,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ReferralRuleChange>> {
        ctx.check()?;
        let mut stmt = self.conn().prepare(
            "SELECT id, rule_id, changed_by, total_discount, discount_type, expired_days,
                    max_discount, max_usage, reward_per_referral, created_at
             FROM referral_rule_changes
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?1 OFFSET ?2",
        )?;

        let rows = stmt.query_map(params![limit, offset], row_to_change)?;

        let mut changes = Vec::new();
        for row in rows {
            changes.push(row?);
        }
        Ok(changes)
    }
}

impl Database {
    /// Number of audit rows.
    pub fn count_rule_changes(&self) -> Result<i64> {
        Ok(self
            .conn()
            .query_row("SELECT COUNT(*) FROM referral_rule_changes", [], |row| {
                row.get(0)
            })?)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_rule(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferralRule> {
    Ok(ReferralRule {
        id: row.get(0)?,
        params: params_at(row, 1)?,
        created_at: timestamp_at(row, 7)?,
        updated_at: timestamp_at(row, 8)?,
    })
}

fn row_to_change(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferralRuleChange> {
    Ok(ReferralRuleChange {
        id: uuid_at(row, 0)?,
        rule_id: row.get(1)?,
        changed_by: account_at(row, 2)?,
        params: params_at(row, 3)?,
        created_at: timestamp_at(row, 9)?,
    })
}
