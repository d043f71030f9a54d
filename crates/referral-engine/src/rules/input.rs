//! Rule mutation input and its validation.

use referral_shared::constants::MAX_PERCENTAGE;
use referral_shared::types::{DiscountType, RuleParams};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Requested rule values, as decoded by the transport.
///
/// `discount_type` is kept as text so an unknown value is reported as a
/// validation error on that field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleInput {
    pub total_discount: i64,
    pub discount_type: String,
    #[serde(default)]
    pub expired_days: Option<i64>,
    #[serde(default)]
    pub max_discount: i64,
    #[serde(default)]
    pub max_usage: Option<i64>,
    pub reward_per_referral: i64,
}

impl RuleInput {
    /// Validate and normalize into the parameters that would be persisted.
    ///
    /// Checks run in a fixed order and stop at the first failure.
    pub fn validate(&self) -> Result<RuleParams> {
        let discount_type: DiscountType = self.discount_type.parse().map_err(|_| {
            EngineError::validation("discount_type", "must be one of: fixed, percentage")
        })?;

        let max_discount = match discount_type {
            DiscountType::Fixed => self.total_discount,
            DiscountType::Percentage => self.max_discount,
        };

        if self.total_discount < 0 {
            return Err(EngineError::validation(
                "total_discount",
                "must be greater than or equal to 0",
            ));
        }
        if max_discount < 0 {
            return Err(EngineError::validation(
                "max_discount",
                "must be greater than or equal to 0",
            ));
        }
        if self.reward_per_referral < 0 {
            return Err(EngineError::validation(
                "reward_per_referral",
                "must be greater than or equal to 0",
            ));
        }
        if matches!(self.expired_days, Some(days) if days <= 0) {
            return Err(EngineError::validation(
                "expired_days",
                "must be greater than 0",
            ));
        }
        if matches!(self.max_usage, Some(usage) if usage <= 0) {
            return Err(EngineError::validation("max_usage", "must be greater than 0"));
        }
        if discount_type == DiscountType::Percentage && self.total_discount > MAX_PERCENTAGE {
            return Err(EngineError::validation(
                "total_discount",
                format!("percentage discount cannot exceed {MAX_PERCENTAGE}"),
            ));
        }

        Ok(RuleParams {
            total_discount: self.total_discount,
            discount_type,
            expired_days: self.expired_days,
            max_discount,
            max_usage: self.max_usage,
            reward_per_referral: self.reward_per_referral,
        })
    }
}

impl From<&RuleParams> for RuleInput {
    fn from(params: &RuleParams) -> Self {
        Self {
            total_discount: params.total_discount,
            discount_type: params.discount_type.as_str().to_string(),
            expired_days: params.expired_days,
            max_discount: params.max_discount,
            max_usage: params.max_usage,
            reward_per_referral: params.reward_per_referral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(discount_type: &str, total: i64, max: i64) -> RuleInput {
        RuleInput {
            total_discount: total,
            discount_type: discount_type.to_string(),
            expired_days: None,
            max_discount: max,
            max_usage: None,
            reward_per_referral: 5_000,
        }
    }

    fn field_of(err: EngineError) -> &'static str {
        match err {
            EngineError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn fixed_forces_max_discount() {
        let params = input("fixed", 50, 99_999).validate().unwrap();
        assert_eq!(params.discount_type, DiscountType::Fixed);
        assert_eq!(params.max_discount, 50);
    }

    #[test]
    fn fixed_ignores_negative_submitted_max() {
        let params = input("fixed", 50, -1).validate().unwrap();
        assert_eq!(params.max_discount, 50);
    }

    #[test]
    fn percentage_keeps_max_discount() {
        let params = input("percentage", 10, 15_000).validate().unwrap();
        assert_eq!(params.max_discount, 15_000);
    }

    #[test]
    fn unknown_type_rejected_first() {
        let err = input("bogus", -5, -5).validate().unwrap_err();
        assert_eq!(field_of(err), "discount_type");
    }

    #[test]
    fn negative_amounts_rejected_in_order() {
        assert_eq!(
            field_of(input("percentage", -1, -1).validate().unwrap_err()),
            "total_discount"
        );
        assert_eq!(
            field_of(input("percentage", 1, -1).validate().unwrap_err()),
            "max_discount"
        );
        let mut negative_reward = input("percentage", 1, 1);
        negative_reward.reward_per_referral = -1;
        assert_eq!(
            field_of(negative_reward.validate().unwrap_err()),
            "reward_per_referral"
        );
    }

    #[test]
    fn optional_fields_must_be_positive() {
        let mut zero_days = input("percentage", 10, 100);
        zero_days.expired_days = Some(0);
        assert_eq!(field_of(zero_days.validate().unwrap_err()), "expired_days");

        let mut zero_usage = input("percentage", 10, 100);
        zero_usage.max_usage = Some(0);
        assert_eq!(field_of(zero_usage.validate().unwrap_err()), "max_usage");

        let mut ok = input("percentage", 10, 100);
        ok.expired_days = Some(1);
        ok.max_usage = Some(1);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn percentage_capped_at_hundred() {
        assert!(input("percentage", 100, 0).validate().is_ok());
        assert_eq!(
            field_of(input("percentage", 101, 0).validate().unwrap_err()),
            "total_discount"
        );
        assert!(input("fixed", 101, 0).validate().is_ok());
    }

    #[test]
    fn deserializes_without_optional_fields() {
        let parsed: RuleInput = serde_json::from_str(
            r#"{"total_discount": 50, "discount_type": "fixed", "reward_per_referral": 10}"#,
        )
        .unwrap();
        assert_eq!(parsed.expired_days, None);
        assert_eq!(parsed.validate().unwrap().max_discount, 50);
    }
}
