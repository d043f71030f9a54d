//! # referral-store
//!
//! Durable storage for the referral program, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and implements the storage traits in
//! [`repository`]: the singleton rule and its audit log, per-account referral
//! codes, account lookup, and the redemption ledger.  Uniqueness of code
//! values and of one code per `(account, type)` is enforced by unique indexes,
//! and violations surface as [`StoreError::UniqueViolation`].

pub mod accounts;
pub mod codes;
pub mod database;
pub mod migrations;
pub mod models;
pub mod redemptions;
pub mod repository;
pub mod rules;

mod error;
mod row;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use repository::{AccountDirectory, CodeStore, RedemptionLedger, RuleStore};
