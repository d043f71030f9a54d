//! # referral-shared
//!
//! Types shared by the referral store, engine and CLI: identifiers, rule
//! parameters, the cancellation [`Context`](context::Context), and referral
//! code generation.

pub mod code;
pub mod constants;
pub mod context;
pub mod error;
pub mod types;
