use thiserror::Error;
use vetchium_db::DbError;
use vetchium_domain_verification::VerificationError;
use vetchium_federation::{RegionError, TokenError};

/// Domain errors for both authentication planes. Handlers map these to HTTP
/// statuses at the REST boundary; nothing below the boundary knows about
/// status codes.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed on '{field}': {message}")]
    Validation { field: String, message: String },

    /// Missing, malformed, expired or consumed credential or token, or a
    /// wrong password. Deliberately indistinguishable from the outside.
    #[error("unauthorized")]
    Unauthorized,

    #[error("wrong TFA code")]
    WrongTfaCode,

    /// Authenticated but lacking the required role.
    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    /// The entity exists but its state forbids the operation: disabled
    /// users, unverified domains, the last-admin guard.
    #[error("{0}")]
    InvalidState(String),

    #[error("database error")]
    Database(#[source] DbError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }
}

impl From<DbError> for DomainError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => Self::NotFound,
            DbError::UniqueViolation => Self::Conflict("already exists".to_owned()),
            DbError::InvalidState(msg) => Self::InvalidState(msg),
            other => Self::Database(other),
        }
    }
}

impl From<TokenError> for DomainError {
    fn from(_: TokenError) -> Self {
        Self::Unauthorized
    }
}

impl From<RegionError> for DomainError {
    fn from(e: RegionError) -> Self {
        match e {
            RegionError::InvalidCode(code) | RegionError::Unknown(code) => {
                Self::validation("home_region", format!("unknown region: {code}"))
            }
        }
    }
}

impl From<VerificationError> for DomainError {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::NotFound => Self::NotFound,
            VerificationError::AlreadyClaimed => Self::Conflict("domain already claimed".to_owned()),
            VerificationError::VerificationFailed(msg) => Self::InvalidState(msg),
            VerificationError::Region(e) => e.into(),
            VerificationError::Db(e) => Self::Database(e),
        }
    }
}

impl From<bcrypt::BcryptError> for DomainError {
    fn from(e: bcrypt::BcryptError) -> Self {
        tracing::error!(error = %e, "bcrypt failure");
        Self::Internal("password hashing failed".to_owned())
    }
}
