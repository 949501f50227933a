use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("access denied")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    /// Stable machine-readable discriminant, independent of display text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound { .. } => "not-found",
            Self::InvalidStateTransition(_) => "invalid-state-transition",
            Self::TransactionFailed(_) => "transaction-failed",
            Self::Csv(_) => "csv",
            Self::Io(_) => "io",
            #[cfg(feature = "storage-rocksdb")]
            Self::Storage(_) => "storage",
            Self::Internal(_) => "internal",
        }
    }

    pub(crate) fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }
}
