use thiserror::Error;

use dbcore_store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Stable code for the failure kind, shared with [`StoreError::code`].
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.code(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
