//! # referral-engine
//!
//! Decision logic of the referral program:
//!
//! - [`RuleService`]: the singleton discount/reward rule, lazily initialized,
//!   mutated only by admins, with an audit row per real change
//! - [`IssuanceService`]: one collision-free basic code per account, safe
//!   under concurrent first-time requests
//! - [`RedemptionValidator`]: redemption-time checks against the code's
//!   snapshot terms and the redemption ledger
//!
//! The services are generic over the storage traits of `referral-store` and
//! hold no state of their own; every exclusivity guarantee comes from the
//! store's constraints and transactions.

pub mod actor;
pub mod error;
pub mod issuance;
pub mod redemption;
pub mod rules;

pub use actor::Actor;
pub use error::{EngineError, ErrorKind};
pub use issuance::IssuanceService;
pub use redemption::{
    DiscountTerms, Rejection, RedemptionValidator, ReferralValidationResponse, RewardTerms,
};
pub use rules::{RuleInput, RuleService};
