//! Field-by-field comparison of two rule snapshots.

use referral_shared::types::RuleParams;

/// Names of the fields that differ between `current` and `next`.
///
/// Optional fields compare equal when both are absent or both hold the same
/// value.  An empty result means the write would be a no-op.
pub fn changed_fields(current: &RuleParams, next: &RuleParams) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if current.total_discount != next.total_discount {
        changed.push("total_discount");
    }
    if current.discount_type != next.discount_type {
        changed.push("discount_type");
    }
    if current.expired_days != next.expired_days {
        changed.push("expired_days");
    }
    if current.max_discount != next.max_discount {
        changed.push("max_discount");
    }
    if current.max_usage != next.max_usage {
        changed.push("max_usage");
    }
    if current.reward_per_referral != next.reward_per_referral {
        changed.push("reward_per_referral");
    }
    changed
}
