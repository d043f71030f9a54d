//! Column decoding helpers shared by the row mappers.
//!
//! Conversion failures are reported as
//! [`rusqlite::Error::FromSqlConversionFailure`] carrying the column index.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use referral_shared::types::{AccountId, RuleParams};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

/// Current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Fixed-width RFC-3339 so stored timestamps sort lexicographically.
pub(crate) fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn account_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<AccountId> {
    uuid_at(row, idx).map(AccountId)
}

pub(crate) fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn parsed_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let s: String = row.get(idx)?;
    s.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read the six rule-parameter columns starting at `start`, in the order
/// `total_discount, discount_type, expired_days, max_discount, max_usage,
/// reward_per_referral`.
pub(crate) fn params_at(row: &Row<'_>, start: usize) -> rusqlite::Result<RuleParams> {
    Ok(RuleParams {
        total_discount: row.get(start)?,
        discount_type: parsed_at(row, start + 1)?,
        expired_days: row.get(start + 2)?,
        max_discount: row.get(start + 3)?,
        max_usage: row.get(start + 4)?,
        reward_per_referral: row.get(start + 5)?,
    })
}
