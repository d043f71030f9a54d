use referral_engine::{EngineError, ErrorKind};
use referral_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Usage: {0}")]
    Usage(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code, grouped like HTTP status families.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) | CliError::Json(_) => 2,
            CliError::Engine(e) => match e.kind() {
                ErrorKind::Validation | ErrorKind::BadRequest => 3,
                ErrorKind::Forbidden => 4,
                ErrorKind::NotFound => 5,
                ErrorKind::Internal => 1,
            },
            CliError::Store(_) => 1,
        }
    }

    /// Message printed to the user; internal causes only go to the log.
    pub fn user_message(&self) -> String {
        match self {
            CliError::Engine(e) => e.public_message(),
            CliError::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), 2);
        assert_eq!(
            CliError::Engine(EngineError::Forbidden("no".into())).exit_code(),
            4
        );
        assert_eq!(
            CliError::Engine(EngineError::CodeGenerationExhausted { attempts: 10 }).exit_code(),
            3
        );
    }

    #[test]
    fn test_store_errors_are_hidden() {
        let err = CliError::Store(StoreError::Migration("boom".into()));
        assert_eq!(err.user_message(), "Internal server error");
        assert_eq!(err.exit_code(), 1);
    }
}
