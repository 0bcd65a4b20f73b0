//! Permission-gated namespace resolution for cached calls.
//!
//! Every cached call goes through [`CacheResolver::resolve_caches`]: the call's
//! dataset identity is located, the owner's permission tag is checked against
//! the evaluator, and only then is the partition for the call's namespace
//! looked up (and created on first use).

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, instrument, warn};

use crate::domain::dataset::DatasetIdentity;
use crate::domain::permission::{PermissionEvaluator, Principal, permission_for_tag};

use super::config::CacheConfig;
use super::error::CacheError;
use super::generator::generate_key;
use super::locator::{CallArg, locate};
use super::metrics::{METRIC_CACHE_HIT, METRIC_CACHE_MISS, METRIC_PERMISSION_DENIED};
use super::namespace::{OperationDescriptor, resolve_namespace, resolve_operation_name};
use super::store::{CachePartition, CacheStore};

/// A single invocation of a cached operation.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub principal: &'a Principal,
    pub operation: &'a OperationDescriptor,
    pub args: &'a [CallArg],
}

impl<'a> CallContext<'a> {
    pub fn new(
        principal: &'a Principal,
        operation: &'a OperationDescriptor,
        args: &'a [CallArg],
    ) -> Self {
        Self {
            principal,
            operation,
            args,
        }
    }
}

pub struct CacheResolver<S, E> {
    store: Arc<S>,
    evaluator: Arc<E>,
    config: CacheConfig,
}

impl<S, E> CacheResolver<S, E>
where
    S: CacheStore,
    E: PermissionEvaluator,
{
    pub fn new(store: Arc<S>, evaluator: Arc<E>, config: CacheConfig) -> Self {
        Self {
            store,
            evaluator,
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Resolve the partition a call reads from and writes to.
    ///
    /// Fails with [`CacheError::MissingDatasetIdentity`] when no argument carries
    /// datasets and with [`CacheError::PermissionDenied`] when the owner's tag is
    /// not granted. Neither failure touches the store.
    #[instrument(
        skip_all,
        fields(
            owner = ctx.operation.owner.name,
            operation = ctx.operation.name,
            principal = %ctx.principal.name,
        )
    )]
    pub fn resolve_caches(
        &self,
        ctx: &CallContext<'_>,
    ) -> Result<Arc<S::Partition>, CacheError> {
        let identity = locate(ctx.args).ok_or(CacheError::MissingDatasetIdentity)?;
        self.authorize(ctx, &identity)?;

        let operation = resolve_operation_name(ctx.operation, ctx.args);
        let namespace =
            resolve_namespace(&self.config, &identity, ctx.operation.owner.name, operation);
        debug!(namespace = %namespace, datasets = %identity, "Resolved cache namespace");

        Ok(self.store.partition(&namespace)?)
    }

    /// Return the cached result for the call, computing and storing it on a miss.
    pub fn memoize<F, Err>(
        &self,
        ctx: &CallContext<'_>,
        compute: F,
    ) -> Result<<S::Partition as CachePartition>::Value, Err>
    where
        F: FnOnce() -> Result<<S::Partition as CachePartition>::Value, Err>,
        Err: From<CacheError>,
    {
        let partition = self.resolve_caches(ctx)?;
        let key = generate_key(ctx.args);

        if let Some(value) = partition.get(&key).map_err(CacheError::from)? {
            counter!(METRIC_CACHE_HIT, "owner" => ctx.operation.owner.name).increment(1);
            return Ok(value);
        }

        counter!(METRIC_CACHE_MISS, "owner" => ctx.operation.owner.name).increment(1);
        let value = compute()?;
        partition
            .insert(key, value.clone())
            .map_err(CacheError::from)?;
        Ok(value)
    }

    fn authorize(
        &self,
        ctx: &CallContext<'_>,
        identity: &DatasetIdentity,
    ) -> Result<(), CacheError> {
        let Some(tag) = ctx.operation.owner.required_permission else {
            return Ok(());
        };

        let granted = match permission_for_tag(tag) {
            Some(permission) => {
                self.evaluator
                    .has_permission(ctx.principal, identity, permission)
            }
            None => {
                warn!(
                    owner = ctx.operation.owner.name,
                    permission_tag = tag,
                    "Unrecognised permission tag; denying"
                );
                false
            }
        };

        if granted {
            return Ok(());
        }

        counter!(METRIC_PERMISSION_DENIED, "permission" => tag).increment(1);
        warn!(
            principal = %ctx.principal,
            permission_tag = tag,
            datasets = %identity,
            "Cache access denied"
        );
        Err(CacheError::PermissionDenied {
            principal: ctx.principal.name.clone(),
            permission_tag: tag.to_string(),
            datasets: identity.clone(),
        })
    }
}
