use referral_shared::context::Context;
use referral_shared::types::{AccountId, Role};
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::Account;
use crate::repository::AccountDirectory;
use crate::row::{account_at, now, parsed_at, timestamp_at, ts};

impl AccountDirectory for Database {
    fn get_account(&self, ctx: &Context, id: AccountId) -> Result<Account> {
        ctx.check()?;
        Ok(self.conn().query_row(
            "SELECT id, role, created_at FROM accounts WHERE id = ?1",
            params![id.to_string()],
            row_to_account,
        )?)
    }
}

impl Database {
    /// Register an account, or update the role of an existing one.
    pub fn upsert_account(&self, id: AccountId, role: Role) -> Result<Account> {
        Ok(self.conn().query_row(
            "INSERT INTO accounts (id, role, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET role = excluded.role
             RETURNING id, role, created_at",
            params![id.to_string(), role.as_str(), ts(&now())],
            row_to_account,
        )?)
    }
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: account_at(row, 0)?,
        role: parsed_at(row, 1)?,
        created_at: timestamp_at(row, 2)?,
    })
}
