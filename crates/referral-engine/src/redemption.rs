//! Redemption-time validation of referral codes.
//!
//! Terms always come from the snapshot stored on the code at issuance, never
//! from the live rule.  An unusable code is an expected business outcome and
//! is reported as `valid: false` with a reason, not as an error.
//!
//! Usage counting is backed by the redemption ledger: `validate` reads the
//! current count, and `redeem` re-checks the cap and records the redemption
//! inside a single write transaction.

use chrono::{DateTime, Duration, Utc};
use referral_shared::code::normalize_code;
use referral_shared::context::Context;
use referral_shared::types::{AccountId, DiscountType};
use referral_store::{
    CodeStore, ProfileReferralCode, RedemptionLedger, ReferralRedemption, StoreError,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, Result};

/// Discount granted to the redeemer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscountTerms {
    pub discount_type: DiscountType,
    pub total_discount: i64,
    pub max_discount: i64,
}

impl DiscountTerms {
    /// Discount applied to a purchase of `amount`.
    ///
    /// Never exceeds `amount`; percentage discounts are also capped at
    /// `max_discount`.
    pub fn discount_for(&self, amount: i64) -> i64 {
        let amount = amount.max(0);
        let raw = match self.discount_type {
            DiscountType::Fixed => self.total_discount,
            DiscountType::Percentage => {
                let pct = (amount as i128 * self.total_discount as i128) / 100;
                (pct.min(self.max_discount as i128)) as i64
            }
        };
        raw.clamp(0, amount)
    }
}

/// Reward credited to the code owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RewardTerms {
    pub owner_profile_id: AccountId,
    pub reward_per_referral: i64,
}

/// Why a code cannot be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotFound,
    Inactive,
    SelfRedemption,
    Expired,
    AlreadyRedeemed,
    UsageLimitReached,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::NotFound => "not found",
            Rejection::Inactive => "inactive",
            Rejection::SelfRedemption => "self redemption is not allowed",
            Rejection::Expired => "expired",
            Rejection::AlreadyRedeemed => "already redeemed",
            Rejection::UsageLimitReached => "usage limit reached",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralValidationResponse {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountTerms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<RewardTerms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Redemptions left before the cap; `None` when uncapped or invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_usage: Option<i64>,
}

impl ReferralValidationResponse {
    fn rejected(reason: Rejection) -> Self {
        Self {
            valid: false,
            message: reason.message().to_string(),
            code: None,
            discount: None,
            reward: None,
            expires_at: None,
            remaining_usage: None,
        }
    }

    fn accepted(code: &ProfileReferralCode, used: i64) -> Self {
        Self {
            valid: true,
            message: "valid".to_string(),
            code: Some(code.code.clone()),
            discount: Some(DiscountTerms {
                discount_type: code.params.discount_type,
                total_discount: code.params.total_discount,
                max_discount: code.params.max_discount,
            }),
            reward: Some(RewardTerms {
                owner_profile_id: code.profile_id,
                reward_per_referral: code.params.reward_per_referral,
            }),
            expires_at: expires_at(code),
            remaining_usage: code.params.max_usage.map(|cap| (cap - used).max(0)),
        }
    }
}

/// Result of evaluating a code for one redeemer.
enum Verdict {
    Accepted(ProfileReferralCode, i64),
    Rejected(Rejection),
}

pub struct RedemptionValidator<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> RedemptionValidator<'a, S>
where
    S: CodeStore + RedemptionLedger + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Decide whether `account` may redeem `code` within
    /// `business_context_id`, and on success report the code's terms.
    pub fn validate(
        &self,
        ctx: &Context,
        code: &str,
        account: AccountId,
        business_context_id: &str,
    ) -> Result<ReferralValidationResponse> {
        self.validate_at(ctx, code, account, business_context_id, Utc::now())
    }

    /// [`validate`](Self::validate) against an explicit clock.
    pub fn validate_at(
        &self,
        ctx: &Context,
        code: &str,
        account: AccountId,
        business_context_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ReferralValidationResponse> {
        Ok(match self.evaluate(ctx, code, account, business_context_id, now)? {
            Verdict::Accepted(found, used) => ReferralValidationResponse::accepted(&found, used),
            Verdict::Rejected(reason) => ReferralValidationResponse::rejected(reason),
        })
    }

    /// Validate and then record the redemption.
    ///
    /// Rejections come back as [`EngineError::BadRequest`] carrying the
    /// rejection message.
    pub fn redeem(
        &self,
        ctx: &Context,
        code: &str,
        account: AccountId,
        business_context_id: &str,
    ) -> Result<ReferralRedemption> {
        let found = match self.evaluate(ctx, code, account, business_context_id, Utc::now())? {
            Verdict::Accepted(found, _) => found,
            Verdict::Rejected(reason) => {
                return Err(EngineError::BadRequest(reason.message().to_string()))
            }
        };

        match self
            .store
            .record_redemption(ctx, &found, account, business_context_id)
        {
            Ok(redemption) => {
                info!(
                    code = %found.code,
                    owner = %found.profile_id,
                    redeemer = %account,
                    business_context_id,
                    "referral code redeemed"
                );
                Ok(redemption)
            }
            Err(StoreError::CodeInactive) => Err(EngineError::BadRequest(
                Rejection::Inactive.message().to_string(),
            )),
            Err(StoreError::UsageLimitReached) => Err(EngineError::BadRequest(
                Rejection::UsageLimitReached.message().to_string(),
            )),
            Err(StoreError::UniqueViolation(_)) => Err(EngineError::BadRequest(
                Rejection::AlreadyRedeemed.message().to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn evaluate(
        &self,
        ctx: &Context,
        code: &str,
        account: AccountId,
        business_context_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Verdict> {
        let normalized = normalize_code(code);
        let found = match self.store.find_code_by_value(ctx, &normalized) {
            Ok(found) => found,
            Err(StoreError::NotFound) => {
                debug!(code = %normalized, "referral code not found");
                return Ok(Verdict::Rejected(Rejection::NotFound));
            }
            Err(e) => return Err(e.into()),
        };

        if !found.is_active {
            return Ok(Verdict::Rejected(Rejection::Inactive));
        }
        if found.profile_id == account {
            return Ok(Verdict::Rejected(Rejection::SelfRedemption));
        }
        if matches!(expires_at(&found), Some(at) if at <= now) {
            return Ok(Verdict::Rejected(Rejection::Expired));
        }
        if self
            .store
            .has_redemption(ctx, found.id, account, business_context_id)?
        {
            return Ok(Verdict::Rejected(Rejection::AlreadyRedeemed));
        }

        let used = self.store.count_redemptions(ctx, found.id)?;
        if matches!(found.params.max_usage, Some(cap) if used >= cap) {
            return Ok(Verdict::Rejected(Rejection::UsageLimitReached));
        }

        Ok(Verdict::Accepted(found, used))
    }
}

fn expires_at(code: &ProfileReferralCode) -> Option<DateTime<Utc>> {
    // An offset too large to represent is treated as never expiring.
    code.params
        .expired_days
        .and_then(Duration::try_days)
        .and_then(|offset| code.created_at.checked_add_signed(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(discount_type: DiscountType, total: i64, max: i64) -> DiscountTerms {
        DiscountTerms {
            discount_type,
            total_discount: total,
            max_discount: max,
        }
    }

    #[test]
    fn fixed_discount_bounded_by_amount() {
        let fixed = terms(DiscountType::Fixed, 5_000, 5_000);
        assert_eq!(fixed.discount_for(20_000), 5_000);
        assert_eq!(fixed.discount_for(3_000), 3_000);
        assert_eq!(fixed.discount_for(-10), 0);
    }

    #[test]
    fn percentage_discount_capped() {
        let pct = terms(DiscountType::Percentage, 10, 1_500);
        assert_eq!(pct.discount_for(10_000), 1_000);
        assert_eq!(pct.discount_for(100_000), 1_500);

        let full = terms(DiscountType::Percentage, 100, 20_000);
        assert_eq!(full.discount_for(8_000), 8_000);
        assert_eq!(full.discount_for(50_000), 20_000);
    }

    #[test]
    fn rejection_messages() {
        assert_eq!(Rejection::NotFound.message(), "not found");
        assert_eq!(
            ReferralValidationResponse::rejected(Rejection::Expired).message,
            "expired"
        );
    }
}
