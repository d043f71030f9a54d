//! Redemption ledger.
//!
//! A code's usage count is the number of rows referencing it here.  The
//! active flag, the cap check and the insert share one `BEGIN IMMEDIATE`
//! transaction, so two concurrent redemptions cannot both take the last slot
//! and a code disabled mid-request is not redeemed.

use referral_shared::context::Context;
use referral_shared::types::AccountId;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::database::{commit, Database};
use crate::error::{Result, StoreError};
use crate::models::{ProfileReferralCode, ReferralRedemption};
use crate::repository::RedemptionLedger;
use crate::row::{account_at, now, timestamp_at, ts, uuid_at};

impl RedemptionLedger for Database {
    fn count_redemptions(&self, ctx: &Context, code_id: Uuid) -> Result<i64> {
        ctx.check()?;
        count_for(self.conn(), code_id)
    }

    fn has_redemption(
        &self,
        ctx: &Context,
        code_id: Uuid,
        redeemer: AccountId,
        business_context_id: &str,
    ) -> Result<bool> {
        ctx.check()?;
        let found: i64 = self.conn().query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM referral_redemptions
                 WHERE code_id = ?1 AND redeemer_profile_id = ?2 AND business_context_id = ?3
             )",
            params![code_id.to_string(), redeemer.to_string(), business_context_id],
            |row| row.get(0),
        )?;
        Ok(found != 0)
    }

    fn record_redemption(
        &self,
        ctx: &Context,
        code: &ProfileReferralCode,
        redeemer: AccountId,
        business_context_id: &str,
    ) -> Result<ReferralRedemption> {
        let tx = self.begin_immediate(ctx)?;

        let is_active: bool = tx.query_row(
            "SELECT is_active FROM profile_referral_codes WHERE id = ?1",
            params![code.id.to_string()],
            |row| row.get(0),
        )?;
        if !is_active {
            tracing::debug!(code_id = %code.id, "code deactivated before redemption");
            return Err(StoreError::CodeInactive);
        }

        if let Some(max_usage) = code.params.max_usage {
            let used = count_for(&tx, code.id)?;
            if used >= max_usage {
                tracing::debug!(code_id = %code.id, used, max_usage, "redemption cap reached");
                return Err(StoreError::UsageLimitReached);
            }
        }

        ctx.check()?;
        let redemption = ReferralRedemption {
            id: Uuid::new_v4(),
            code_id: code.id,
            redeemer_profile_id: redeemer,
            business_context_id: business_context_id.to_string(),
            created_at: now(),
        };
        tx.execute(
            "INSERT INTO referral_redemptions
                 (id, code_id, redeemer_profile_id, business_context_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                redemption.id.to_string(),
                redemption.code_id.to_string(),
                redemption.redeemer_profile_id.to_string(),
                redemption.business_context_id,
                ts(&redemption.created_at),
            ],
        )?;

        commit(ctx, tx)?;
        Ok(redemption)
    }
}

impl Database {
    /// Redemptions of one code, oldest first.
    pub fn list_redemptions_for_code(&self, code_id: Uuid) -> Result<Vec<ReferralRedemption>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, code_id, redeemer_profile_id, business_context_id, created_at
             FROM referral_redemptions
             WHERE code_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![code_id.to_string()], |row| {
            Ok(ReferralRedemption {
                id: uuid_at(row, 0)?,
                code_id: uuid_at(row, 1)?,
                redeemer_profile_id: account_at(row, 2)?,
                business_context_id: row.get(3)?,
                created_at: timestamp_at(row, 4)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)
    }
}

fn count_for(conn: &Connection, code_id: Uuid) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM referral_redemptions WHERE code_id = ?1",
        params![code_id.to_string()],
        |row| row.get(0),
    )?)
}
