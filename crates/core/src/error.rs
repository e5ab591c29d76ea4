use crate::outcome::ErrorKind;

/// Domain errors raised before any execution is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The outcome error kind reported to callers for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnsupportedLanguage(_) => ErrorKind::UnsupportedLanguage,
            Self::Internal(_) => ErrorKind::Infra,
        }
    }
}
