use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid account id: {0}")]
    AccountId(String),

    #[error("Unknown role: {0}")]
    Role(String),

    #[error("Unknown discount type: {0}")]
    DiscountType(String),

    #[error("Unknown code type: {0}")]
    CodeType(String),
}

/// Why a [`Context`](crate::context::Context) stopped admitting work.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,
}
