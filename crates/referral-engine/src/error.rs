use referral_store::StoreError;
use thiserror::Error;

/// Errors returned by the referral engine's public operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Every generated candidate collided with an existing code.
    #[error("Unable to generate unique referral code after {attempts} attempts")]
    CodeGenerationExhausted { attempts: u32 },

    #[error("Internal error: {0}")]
    Internal(#[from] StoreError),
}

/// Client-facing error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    BadRequest,
    Internal,
}

impl ErrorKind {
    /// HTTP status a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation | ErrorKind::BadRequest => 400,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }
}

impl EngineError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation { .. } => ErrorKind::Validation,
            EngineError::Forbidden(_) => ErrorKind::Forbidden,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::BadRequest(_) | EngineError::CodeGenerationExhausted { .. } => {
                ErrorKind::BadRequest
            }
            EngineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to show the caller; storage details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            EngineError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhaustion_is_bad_request_family() {
        let err = EngineError::CodeGenerationExhausted { attempts: 10 };
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.kind().status_code(), 400);
        assert!(err.public_message().contains("10 attempts"));
    }

    #[test]
    fn test_internal_hides_cause() {
        let err = EngineError::from(StoreError::Migration("table exploded".into()));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.to_string().contains("table exploded"));
    }

    #[test]
    fn test_validation_names_field() {
        let err = EngineError::validation("max_usage", "must be greater than 0");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Invalid max_usage: must be greater than 0");
    }
}
