//! Domain model structs persisted in the referral database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to whatever transport renders engine results.

use chrono::{DateTime, Utc};
use referral_shared::types::{AccountId, CodeType, RuleParams, Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A known account, as far as authorization is concerned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Referral rule
// ---------------------------------------------------------------------------

/// The singleton rule governing codes issued from now on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralRule {
    /// Always [`RULE_SINGLETON_ID`](referral_shared::constants::RULE_SINGLETON_ID).
    pub id: i64,
    #[serde(flatten)]
    pub params: RuleParams,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One audit row: who changed the rule and what it became.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralRuleChange {
    pub id: Uuid,
    pub rule_id: i64,
    /// Account that performed the mutation.
    pub changed_by: AccountId,
    /// Post-mutation snapshot, copied from the persisted rule row.
    #[serde(flatten)]
    pub params: RuleParams,
    pub created_at: DateTime<Utc>,
}

impl ReferralRuleChange {
    /// Build the audit entry for a rule row exactly as it was persisted.
    pub fn snapshot_of(rule: &ReferralRule, changed_by: AccountId) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule_id: rule.id,
            changed_by,
            params: rule.params.clone(),
            created_at: rule.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Referral code
// ---------------------------------------------------------------------------

/// A code owned by one account, carrying the rule terms in force when it was
/// issued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileReferralCode {
    pub id: Uuid,
    /// Owning account.
    pub profile_id: AccountId,
    pub code: String,
    #[serde(rename = "type")]
    pub code_type: CodeType,
    pub is_active: bool,
    /// Rule parameters at issuance. Never refreshed from the live rule.
    #[serde(flatten)]
    pub params: RuleParams,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation template for [`ProfileReferralCode`]; the code value is supplied
/// per insert attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReferralCode {
    pub profile_id: AccountId,
    pub code_type: CodeType,
    pub is_active: bool,
    pub params: RuleParams,
}

// ---------------------------------------------------------------------------
// Redemption
// ---------------------------------------------------------------------------

/// An accepted use of a referral code.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReferralRedemption {
    pub id: Uuid,
    pub code_id: Uuid,
    pub redeemer_profile_id: AccountId,
    /// Caller-defined scope of the redemption (order, booking, ...).
    pub business_context_id: String,
    pub created_at: DateTime<Utc>,
}
