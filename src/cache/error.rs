use thiserror::Error;

use crate::domain::dataset::DatasetIdentity;

use super::store::StoreError;

/// Failures surfaced by key generation, resolution and invalidation.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("call arguments carry no dataset identity")]
    MissingDatasetIdentity,
    #[error("permission denied for {principal}: `{permission_tag}` on {datasets}")]
    PermissionDenied {
        principal: String,
        permission_tag: String,
        datasets: DatasetIdentity,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl CacheError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }
}
