/// Alphabet referral codes are drawn from (36 symbols)
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a generated referral code
pub const CODE_LENGTH: usize = 8;

/// Upper bound on insert attempts when a generated code collides
pub const MAX_CODE_ATTEMPTS: u32 = 10;

/// Primary key of the singleton rule row
pub const RULE_SINGLETON_ID: i64 = 1;

/// Default rule: discount value (percentage units)
pub const DEFAULT_TOTAL_DISCOUNT: i64 = 100;

/// Default rule: cap on a percentage discount
pub const DEFAULT_MAX_DISCOUNT: i64 = 20_000;

/// Default rule: amount credited to the code owner per redemption
pub const DEFAULT_REWARD_PER_REFERRAL: i64 = 20_000;

/// Upper bound for a percentage discount
pub const MAX_PERCENTAGE: i64 = 100;
