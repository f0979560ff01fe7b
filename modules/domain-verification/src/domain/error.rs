use thiserror::Error;
use vetchium_db::DbError;
use vetchium_federation::RegionError;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("domain record not found")]
    NotFound,

    #[error("domain already claimed")]
    AlreadyClaimed,

    #[error("domain verification failed: {0}")]
    VerificationFailed(String),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Db(DbError),
}

impl From<DbError> for VerificationError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound => Self::NotFound,
            DbError::UniqueViolation => Self::AlreadyClaimed,
            other => Self::Db(other),
        }
    }
}
