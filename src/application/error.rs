use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    cache::{CacheError, CatalogError},
    config::LoadError,
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Error chain flattened for reporting at the process boundary.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code, following the BSD `sysexits` conventions.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Domain(_) | AppError::Cache(CacheError::InvalidArgument(_)) => 65,
            AppError::Cache(CacheError::MissingDatasetIdentity) => 65,
            AppError::Cache(CacheError::PermissionDenied { .. }) => 77,
            AppError::Cache(CacheError::StoreUnavailable(_)) => 69,
            AppError::Cache(CacheError::InvalidConfig(_)) => 78,
            AppError::Config(_) | AppError::Catalog(_) => 78,
            AppError::Infra(InfraError::Telemetry(_)) | AppError::Unexpected(_) => 70,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}
