//! CRUD operations for [`ProfileReferralCode`] records.

use referral_shared::context::Context;
use referral_shared::types::{AccountId, CodeType};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::{NewReferralCode, ProfileReferralCode};
use crate::repository::CodeStore;
use crate::row::{account_at, now, params_at, parsed_at, timestamp_at, ts, uuid_at};

const CODE_COLUMNS: &str = "id, profile_id, code, type, is_active, total_discount, discount_type, \
                            expired_days, max_discount, max_usage, reward_per_referral, \
                            created_at, updated_at";

impl CodeStore for Database {
    fn find_code_by_account_and_type(
        &self,
        ctx: &Context,
        profile_id: AccountId,
        code_type: CodeType,
    ) -> Result<ProfileReferralCode> {
        ctx.check()?;
        Ok(self.conn().query_row(
            &format!(
                "SELECT {CODE_COLUMNS}
                 FROM profile_referral_codes
                 WHERE profile_id = ?1 AND type = ?2"
            ),
            params![profile_id.to_string(), code_type.as_str()],
            row_to_code,
        )?)
    }

    fn find_code_by_value(&self, ctx: &Context, code: &str) -> Result<ProfileReferralCode> {
        ctx.check()?;
        Ok(self.conn().query_row(
            &format!("SELECT {CODE_COLUMNS} FROM profile_referral_codes WHERE code = ?1"),
            params![code],
            row_to_code,
        )?)
    }

    fn create_code(
        &self,
        ctx: &Context,
        template: &NewReferralCode,
        code: &str,
    ) -> Result<ProfileReferralCode> {
        self.prepare_write(ctx)?;
        let stamp = ts(&now());
        let snapshot = &template.params;

        // Single autocommit statement: either the row exists afterwards or a
        // constraint error comes back, never a partial write.
        Ok(self.conn().query_row(
            &format!(
                "INSERT INTO profile_referral_codes
                     (id, profile_id, code, type, is_active, total_discount, discount_type,
                      expired_days, max_discount, max_usage, reward_per_referral,
                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
                 RETURNING {CODE_COLUMNS}"
            ),
            params![
                Uuid::new_v4().to_string(),
                template.profile_id.to_string(),
                code,
                template.code_type.as_str(),
                template.is_active,
                snapshot.total_discount,
                snapshot.discount_type.as_str(),
                snapshot.expired_days,
                snapshot.max_discount,
                snapshot.max_usage,
                snapshot.reward_per_referral,
                stamp,
            ],
            row_to_code,
        )?)
    }
}

impl Database {
    /// Number of code rows held by one account, across all types.
    pub fn count_codes_for_account(&self, profile_id: AccountId) -> Result<i64> {
        Ok(self.conn().query_row(
            "SELECT COUNT(*) FROM profile_referral_codes WHERE profile_id = ?1",
            params![profile_id.to_string()],
            |row| row.get(0),
        )?)
    }

    /// Total number of code rows.
    pub fn count_codes(&self) -> Result<i64> {
        Ok(self
            .conn()
            .query_row("SELECT COUNT(*) FROM profile_referral_codes", [], |row| {
                row.get(0)
            })?)
    }

    /// Enable or disable a code.  Returns `true` if a row was updated.
    pub fn set_code_active(&self, ctx: &Context, id: Uuid, is_active: bool) -> Result<bool> {
        self.prepare_write(ctx)?;
        let affected = self.conn().execute(
            "UPDATE profile_referral_codes SET is_active = ?1, updated_at = ?2 WHERE id = ?3",
            params![is_active, ts(&now()), id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_code(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileReferralCode> {
    Ok(ProfileReferralCode {
        id: uuid_at(row, 0)?,
        profile_id: account_at(row, 1)?,
        code: row.get(2)?,
        code_type: parsed_at(row, 3)?,
        is_active: row.get(4)?,
        params: params_at(row, 5)?,
        created_at: timestamp_at(row, 11)?,
        updated_at: timestamp_at(row, 12)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support::open_temp;
    use crate::error::StoreError;
    use referral_shared::types::RuleParams;

    fn template(profile_id: AccountId) -> NewReferralCode {
        NewReferralCode {
            profile_id,
            code_type: CodeType::Basic,
            is_active: true,
            params: RuleParams::default(),
        }
    }

    #[test]
    fn create_and_find() {
        let (_dir, db) = open_temp();
        let ctx = Context::background();
        let owner = AccountId::new();

        let created = db.create_code(&ctx, &template(owner), "ABCD1234").unwrap();
        assert_eq!(created.code, "ABCD1234");
        assert_eq!(created.profile_id, owner);
        assert!(created.is_active);

        let by_owner = db
            .find_code_by_account_and_type(&ctx, owner, CodeType::Basic)
            .unwrap();
        assert_eq!(by_owner, created);
        assert_eq!(db.find_code_by_value(&ctx, "ABCD1234").unwrap(), created);
    }

    #[test]
    fn missing_code_is_not_found() {
        let (_dir, db) = open_temp();
        let ctx = Context::background();
        assert!(matches!(
            db.find_code_by_account_and_type(&ctx, AccountId::new(), CodeType::Basic),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            db.find_code_by_value(&ctx, "ZZZZZZZZ"),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn duplicate_value_is_unique_violation() {
        let (_dir, db) = open_temp();
        let ctx = Context::background();
        db.create_code(&ctx, &template(AccountId::new()), "SAME0000")
            .unwrap();

        let err = db
            .create_code(&ctx, &template(AccountId::new()), "SAME0000")
            .unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");
        assert_eq!(db.count_codes().unwrap(), 1);
    }

    #[test]
    fn second_code_for_account_is_unique_violation() {
        let (_dir, db) = open_temp();
        let ctx = Context::background();
        let owner = AccountId::new();
        db.create_code(&ctx, &template(owner), "FIRST000").unwrap();

        let err = db
            .create_code(&ctx, &template(owner), "SECOND00")
            .unwrap_err();
        assert!(err.is_unique_violation(), "got {err:?}");
        assert_eq!(db.count_codes_for_account(owner).unwrap(), 1);
    }

    #[test]
    fn deactivate_code() {
        let (_dir, db) = open_temp();
        let ctx = Context::background();
        let created = db
            .create_code(&ctx, &template(AccountId::new()), "OFF00000")
            .unwrap();
        assert!(db.set_code_active(&ctx, created.id, false).unwrap());
        assert!(!db.find_code_by_value(&ctx, "OFF00000").unwrap().is_active);
        assert!(!db.set_code_active(&ctx, Uuid::new_v4(), false).unwrap());
    }
}
