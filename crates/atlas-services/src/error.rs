use atlas_core::AtlasError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors with user-friendly messages
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not allowed to {action} '{table}'")]
    Unauthorized { action: &'static str, table: String },

    #[error("Table load failed: {0}")]
    LoadFailed(String),

    #[error("Record update failed: {0}")]
    UpdateFailed(String),

    #[error("Table operation failed: {0}")]
    TableOperationFailed(String),

    #[error("Record has no '{0}' field")]
    MissingRecordId(String),

    #[error(transparent)]
    Store(#[from] AtlasError),
}
