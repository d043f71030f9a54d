//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation.
//!
//! Every process (or thread) that serves referral requests opens its own
//! `Database` on the same file.  All cross-request exclusivity comes from the
//! schema's unique indexes and from SQLite transactions; the handle itself
//! holds no shared in-memory state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use referral_shared::context::Context;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::error::{Result, StoreError};
use crate::migrations;

/// Default time a writer waits on SQLite's write lock.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
    busy_timeout: Duration,
}

impl Database {
    /// Open (or create) the default application database.
    ///
    /// The database file is placed in the platform-appropriate data directory:
    /// - Linux:   `~/.local/share/referral-engine/referrals.db`
    /// - macOS:   `~/Library/Application Support/com.referral.referral-engine/referrals.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\referral\referral-engine\data\referrals.db`
    pub fn new(busy_timeout: Duration) -> Result<Self> {
        let db_path = default_path()?;
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path, busy_timeout)
    }

    /// Open (or create) a database at an explicit path.
    ///
    /// This is useful for tests and for deployments that keep the database
    /// outside the platform data directory.
    pub fn open_at(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(busy_timeout)?;

        migrations::run_migrations(&conn)?;

        Ok(Self { conn, busy_timeout })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Start a write transaction that takes SQLite's write lock up front.
    ///
    /// Dropping the returned transaction without calling `commit` rolls it
    /// back.
    pub(crate) fn begin_immediate(&self, ctx: &Context) -> Result<Transaction<'_>> {
        self.prepare_write(ctx)?;
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    /// Check `ctx` and bound the lock wait of the next write by its deadline.
    ///
    /// The configured busy timeout applies when the context has no deadline.
    pub(crate) fn prepare_write(&self, ctx: &Context) -> Result<()> {
        ctx.check()?;
        let wait = match ctx.remaining() {
            Some(left) => left.min(self.busy_timeout),
            None => self.busy_timeout,
        };
        self.conn.busy_timeout(wait)?;
        Ok(())
    }
}

/// Commit `tx` unless `ctx` was cancelled while it was open.
pub(crate) fn commit(ctx: &Context, tx: Transaction<'_>) -> Result<()> {
    // On error `tx` is dropped here, which rolls it back.
    ctx.check()?;
    tx.commit()?;
    Ok(())
}

/// Platform default database location.
pub fn default_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("com", "referral", "referral-engine").ok_or(StoreError::NoDataDir)?;
    Ok(project_dirs.data_dir().join("referrals.db"))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let (_dir, db) = test_support::open_temp();
        assert!(db.path().is_some());
    }

    #[test]
    fn reopen_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        drop(Database::open_at(&path, DEFAULT_BUSY_TIMEOUT).unwrap());
        let db = Database::open_at(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        let version: u32 = db
            .conn()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, migrations::CURRENT_VERSION);
    }

    #[test]
    fn deadline_bounds_lock_wait() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let holder = Database::open_at(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        let waiter = Database::open_at(&path, DEFAULT_BUSY_TIMEOUT).unwrap();
        holder.conn().execute_batch("BEGIN IMMEDIATE").unwrap();

        let ctx = Context::background().with_timeout(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let err = waiter.begin_immediate(&ctx).unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(2));

        holder.conn().execute_batch("ROLLBACK").unwrap();
        assert!(waiter.begin_immediate(&Context::background()).is_ok());
    }

    #[test]
    fn cancelled_context_refuses_transaction() {
        let (_dir, db) = test_support::open_temp();
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        assert!(matches!(
            db.begin_immediate(&ctx),
            Err(StoreError::Context(_))
        ));
    }
}
