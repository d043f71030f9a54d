use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_MAX_DISCOUNT, DEFAULT_REWARD_PER_REFERRAL, DEFAULT_TOTAL_DISCOUNT};
use crate::error::ParseError;

// Account identity = UUID assigned by the account service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ParseError::AccountId(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl FromStr for Role {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(ParseError::Role(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How `total_discount` is interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// A flat amount off.
    Fixed,
    /// A percentage of the amount, capped by `max_discount`.
    Percentage,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Percentage => "percentage",
        }
    }
}

impl FromStr for DiscountType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "percentage" => Ok(Self::Percentage),
            other => Err(ParseError::DiscountType(other.to_string())),
        }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of referral code an account holds. Only `Basic` is issued today.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    Basic,
}

impl CodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
        }
    }
}

impl FromStr for CodeType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            other => Err(ParseError::CodeType(other.to_string())),
        }
    }
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The discount/reward parameters carried by the rule, its audit rows, and
/// every code snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleParams {
    pub total_discount: i64,
    pub discount_type: DiscountType,
    /// Days a code stays redeemable after issuance. `None` never expires.
    pub expired_days: Option<i64>,
    pub max_discount: i64,
    /// Redemptions allowed per code. `None` is unlimited.
    pub max_usage: Option<i64>,
    pub reward_per_referral: i64,
}

impl Default for RuleParams {
    fn default() -> Self {
        Self {
            total_discount: DEFAULT_TOTAL_DISCOUNT,
            discount_type: DiscountType::Percentage,
            expired_days: None,
            max_discount: DEFAULT_MAX_DISCOUNT,
            max_usage: None,
            reward_per_referral: DEFAULT_REWARD_PER_REFERRAL,
        }
    }
}
