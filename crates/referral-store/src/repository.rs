//! Storage interfaces consumed by the referral engine.
//!
//! [`Database`](crate::Database) implements all of them.  Every method takes
//! the caller's [`Context`] and must check it before touching storage.

use referral_shared::context::Context;
use referral_shared::types::{AccountId, CodeType, RuleParams};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Account, NewReferralCode, ProfileReferralCode, ReferralRedemption, ReferralRule,
    ReferralRuleChange,
};

/// Durable home of the singleton rule and its audit log.
pub trait RuleStore {
    /// Read the rule row. [`StoreError::NotFound`](crate::StoreError::NotFound)
    /// when it has never been created.
    fn read_rule(&self, ctx: &Context) -> Result<ReferralRule>;

    /// Insert `defaults` unless a row already exists, then return the row.
    ///
    /// Safe to race: concurrent callers all observe the same single row.
    fn init_rule(&self, ctx: &Context, defaults: &RuleParams) -> Result<ReferralRule>;

    /// Upsert the rule and append the matching audit row in one transaction.
    ///
    /// The audit row is built from the row returned by the upsert.  Returns
    /// `None`, writing nothing, when the stored rule already holds `params`
    /// at the time the write lock is taken.
    fn upsert_rule_audited(
        &self,
        ctx: &Context,
        changed_by: AccountId,
        params: &RuleParams,
    ) -> Result<Option<(ReferralRule, ReferralRuleChange)>>;

    /// Audit rows, newest first.
    fn list_rule_changes(
        &self,
        ctx: &Context,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ReferralRuleChange>>;
}

/// Durable per-account referral codes.
pub trait CodeStore {
    /// [`StoreError::NotFound`](crate::StoreError::NotFound) when the account
    /// holds no code of that type.
    fn find_code_by_account_and_type(
        &self,
        ctx: &Context,
        profile_id: AccountId,
        code_type: CodeType,
    ) -> Result<ProfileReferralCode>;

    fn find_code_by_value(&self, ctx: &Context, code: &str) -> Result<ProfileReferralCode>;

    /// Insert a code row.  Fails with
    /// [`StoreError::UniqueViolation`](crate::StoreError::UniqueViolation) when
    /// either the code value or `(profile_id, type)` is already taken.
    fn create_code(
        &self,
        ctx: &Context,
        template: &NewReferralCode,
        code: &str,
    ) -> Result<ProfileReferralCode>;
}

/// Resolves actors for authorization.
pub trait AccountDirectory {
    fn get_account(&self, ctx: &Context, id: AccountId) -> Result<Account>;
}

/// Record of accepted redemptions; the source of per-code usage counts.
pub trait RedemptionLedger {
    fn count_redemptions(&self, ctx: &Context, code_id: Uuid) -> Result<i64>;

    fn has_redemption(
        &self,
        ctx: &Context,
        code_id: Uuid,
        redeemer: AccountId,
        business_context_id: &str,
    ) -> Result<bool>;

    /// Append a redemption.  The code's active flag and usage count are
    /// re-read inside the same write transaction:
    /// [`StoreError::CodeInactive`](crate::StoreError::CodeInactive) when the
    /// code was disabled meanwhile, and
    /// [`StoreError::UsageLimitReached`](crate::StoreError::UsageLimitReached)
    /// instead of exceeding `code.params.max_usage`.
    fn record_redemption(
        &self,
        ctx: &Context,
        code: &ProfileReferralCode,
        redeemer: AccountId,
        business_context_id: &str,
    ) -> Result<ReferralRedemption>;
}
