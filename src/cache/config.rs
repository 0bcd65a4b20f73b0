//! Cache configuration.
//!
//! Namespace prefixes per dataset kind and the well-known namespace that
//! records which datasets have been primed, via `dataset-cache.toml`.

use crate::config::{
    CacheSettings, DEFAULT_ADHOC_PREFIX, DEFAULT_PRIMED_OPERATION, DEFAULT_PRIMED_OWNER,
    DEFAULT_STUDY_PREFIX,
};
use crate::domain::dataset::DatasetKind;

use super::error::CacheError;

/// Cache configuration from `dataset-cache.toml`.
///
/// Both prefixes are non-empty and neither starts with the other, so every
/// namespace belongs to at most one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    study_prefix: String,
    adhoc_prefix: String,
    primed_owner: String,
    primed_operation: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            study_prefix: DEFAULT_STUDY_PREFIX.to_string(),
            adhoc_prefix: DEFAULT_ADHOC_PREFIX.to_string(),
            primed_owner: DEFAULT_PRIMED_OWNER.to_string(),
            primed_operation: DEFAULT_PRIMED_OPERATION.to_string(),
        }
    }
}

impl TryFrom<&CacheSettings> for CacheConfig {
    type Error = CacheError;

    fn try_from(settings: &CacheSettings) -> Result<Self, Self::Error> {
        Self::new(
            settings.study_prefix.clone(),
            settings.adhoc_prefix.clone(),
            settings.primed_owner.clone(),
            settings.primed_operation.clone(),
        )
    }
}

/// True when either prefix starts with the other.
pub(crate) fn prefixes_overlap(study_prefix: &str, adhoc_prefix: &str) -> bool {
    study_prefix.starts_with(adhoc_prefix) || adhoc_prefix.starts_with(study_prefix)
}

impl CacheConfig {
    pub fn new(
        study_prefix: impl Into<String>,
        adhoc_prefix: impl Into<String>,
        primed_owner: impl Into<String>,
        primed_operation: impl Into<String>,
    ) -> Result<Self, CacheError> {
        let config = Self {
            study_prefix: study_prefix.into(),
            adhoc_prefix: adhoc_prefix.into(),
            primed_owner: primed_owner.into(),
            primed_operation: primed_operation.into(),
        };

        for (field, value) in [
            ("study_prefix", &config.study_prefix),
            ("adhoc_prefix", &config.adhoc_prefix),
            ("primed_owner", &config.primed_owner),
            ("primed_operation", &config.primed_operation),
        ] {
            if value.trim().is_empty() {
                return Err(CacheError::invalid_config(format!("{field} must not be empty")));
            }
        }
        if prefixes_overlap(&config.study_prefix, &config.adhoc_prefix) {
            return Err(CacheError::invalid_config(format!(
                "prefixes `{}` and `{}` overlap",
                config.study_prefix, config.adhoc_prefix
            )));
        }

        Ok(config)
    }

    /// Default configuration with different kind prefixes.
    pub fn with_prefixes(
        study_prefix: impl Into<String>,
        adhoc_prefix: impl Into<String>,
    ) -> Result<Self, CacheError> {
        Self::new(
            study_prefix,
            adhoc_prefix,
            DEFAULT_PRIMED_OWNER,
            DEFAULT_PRIMED_OPERATION,
        )
    }

    pub fn study_prefix(&self) -> &str {
        &self.study_prefix
    }

    pub fn adhoc_prefix(&self) -> &str {
        &self.adhoc_prefix
    }

    /// Owner of the operation whose entries mark a dataset as primed.
    pub fn primed_owner(&self) -> &str {
        &self.primed_owner
    }

    /// Name of the operation whose entries mark a dataset as primed.
    pub fn primed_operation(&self) -> &str {
        &self.primed_operation
    }

    pub fn prefix(&self, kind: DatasetKind) -> &str {
        match kind {
            DatasetKind::Study => &self.study_prefix,
            DatasetKind::Adhoc => &self.adhoc_prefix,
        }
    }

    /// Kind whose prefix `namespace` starts with, if any.
    pub fn kind_of(&self, namespace: &str) -> Option<DatasetKind> {
        DatasetKind::ALL
            .into_iter()
            .find(|kind| namespace.starts_with(self.prefix(*kind)))
    }
}
