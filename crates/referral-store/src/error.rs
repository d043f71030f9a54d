use referral_shared::error::ContextError;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    /// A UNIQUE / PRIMARY KEY constraint rejected the write.
    ///
    /// Carries SQLite's message, e.g.
    /// `UNIQUE constraint failed: profile_referral_codes.code`.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// The caller's context was cancelled or timed out.
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// A redemption would exceed the code's usage cap.
    #[error("Usage limit reached")]
    UsageLimitReached,

    /// The code was deactivated before the redemption could be recorded.
    #[error("Referral code is inactive")]
    CodeInactive,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref e, ref msg)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StoreError::UniqueViolation(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            other => StoreError::Sqlite(other),
        }
    }
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn test_unique_failure_is_classified() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT NOT NULL UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: StoreError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(err.is_unique_violation(), "got {err:?}");
    }

    #[test]
    fn test_other_constraint_is_not_unique() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT NOT NULL);").unwrap();
        let err: StoreError = conn
            .execute("INSERT INTO t VALUES (NULL)", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }
}
