//! Namespace naming.
//!
//! A namespace is `{kind prefix}{owner}.{operation}`. Operations normally use
//! their own static name; an operation declared with manual naming takes the
//! name from one of its runtime arguments instead, so a single operation can
//! fan out into one partition per argument value.

use tracing::warn;

use crate::domain::dataset::DatasetIdentity;

use super::config::CacheConfig;
use super::locator::CallArg;

/// The type that owns cached operations, e.g. `AdverseEventService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerDescriptor {
    pub name: &'static str,
    /// Tag the caller must hold on the call's datasets; `None` means no check.
    pub required_permission: Option<&'static str>,
}

impl OwnerDescriptor {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            required_permission: None,
        }
    }

    pub const fn requiring(self, tag: &'static str) -> Self {
        Self {
            name: self.name,
            required_permission: Some(tag),
        }
    }
}

/// How an operation's namespace suffix is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNaming {
    /// Use the operation's own name.
    Static,
    /// Use the string argument at `name_arg`; falls back to the static name
    /// when no argument is designated or the argument is not a string.
    Manual { name_arg: Option<usize> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationDescriptor {
    pub owner: OwnerDescriptor,
    pub name: &'static str,
    /// Number of declared parameters.
    pub arity: usize,
    pub naming: CacheNaming,
}

impl OperationDescriptor {
    pub const fn new(owner: OwnerDescriptor, name: &'static str, arity: usize) -> Self {
        Self {
            owner,
            name,
            arity,
            naming: CacheNaming::Static,
        }
    }

    /// Name the cache after the string passed at position `index`.
    pub const fn named_by_arg(self, index: usize) -> Self {
        Self {
            naming: CacheNaming::Manual {
                name_arg: Some(index),
            },
            ..self
        }
    }

    /// Declare manual naming without designating an argument.
    pub const fn manually_named(self) -> Self {
        Self {
            naming: CacheNaming::Manual { name_arg: None },
            ..self
        }
    }
}

/// Compose the namespace for `identity`'s kind, `owner` and `operation`.
pub fn resolve_namespace(
    config: &CacheConfig,
    identity: &DatasetIdentity,
    owner: &str,
    operation: &str,
) -> String {
    format!("{}{}.{}", config.prefix(identity.kind()), owner, operation)
}

/// Pick the operation-name part of the namespace for a call.
pub fn resolve_operation_name<'a>(
    operation: &'a OperationDescriptor,
    args: &'a [CallArg],
) -> &'a str {
    let name_arg = match operation.naming {
        CacheNaming::Static => return operation.name,
        CacheNaming::Manual { name_arg } => name_arg,
    };

    let Some(index) = name_arg else {
        warn!(
            owner = operation.owner.name,
            operation = operation.name,
            "Manual cache naming declared without a name argument; using operation name"
        );
        return operation.name;
    };

    match args
        .get(index)
        .and_then(CallArg::as_key_value)
        .and_then(|value| value.as_str())
    {
        Some(name) if !name.is_empty() => name,
        _ => {
            warn!(
                owner = operation.owner.name,
                operation = operation.name,
                index,
                "Cache name argument missing or not a non-empty string; using operation name"
            );
            operation.name
        }
    }
}
