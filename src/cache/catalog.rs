//! Startup registry of cached operations.
//!
//! Every cached operation is declared once, up front, with its owner, arity
//! and naming rule. Registration rejects declarations the resolver could not
//! honour, so nothing about an operation's metadata is inspected per call.

use std::collections::HashMap;

use thiserror::Error;

use super::namespace::{CacheNaming, OperationDescriptor};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("operation `{owner}.{operation}` is registered twice")]
    Duplicate {
        owner: &'static str,
        operation: &'static str,
    },
    #[error("operation `{owner}.{operation}` has an empty name")]
    EmptyName {
        owner: &'static str,
        operation: &'static str,
    },
    #[error(
        "operation `{owner}.{operation}` names its cache after argument {index} but takes only {arity}"
    )]
    NameArgOutOfRange {
        owner: &'static str,
        operation: &'static str,
        index: usize,
        arity: usize,
    },
}

#[derive(Debug, Default)]
pub struct OperationCatalog {
    operations: HashMap<(&'static str, &'static str), OperationDescriptor>,
}

impl OperationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = OperationDescriptor>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        for descriptor in descriptors {
            catalog.register(descriptor)?;
        }
        Ok(catalog)
    }

    pub fn register(&mut self, descriptor: OperationDescriptor) -> Result<(), CatalogError> {
        let owner = descriptor.owner.name;
        let operation = descriptor.name;

        if owner.is_empty() || operation.is_empty() {
            return Err(CatalogError::EmptyName { owner, operation });
        }

        if let CacheNaming::Manual {
            name_arg: Some(index),
        } = descriptor.naming
            && index >= descriptor.arity
        {
            return Err(CatalogError::NameArgOutOfRange {
                owner,
                operation,
                index,
                arity: descriptor.arity,
            });
        }

        if self.operations.contains_key(&(owner, operation)) {
            return Err(CatalogError::Duplicate { owner, operation });
        }
        self.operations.insert((owner, operation), descriptor);
        Ok(())
    }

    pub fn get<'a>(&'a self, owner: &'a str, operation: &'a str) -> Option<&'a OperationDescriptor> {
        // Shorten the key lifetime so borrowed names can be looked up.
        let operations: &HashMap<(&str, &str), OperationDescriptor> = &self.operations;
        operations.get(&(owner, operation))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperationDescriptor> {
        self.operations.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::namespace::OwnerDescriptor;

    const VITALS: OwnerDescriptor = OwnerDescriptor::new("VitalSignService");

    #[test]
    fn registered_operations_are_found() {
        let catalog = OperationCatalog::from_descriptors([
            OperationDescriptor::new(VITALS, "summary", 1),
            OperationDescriptor::new(VITALS, "distinct_values", 2).named_by_arg(1),
        ])
        .expect("catalog");

        assert_eq!(catalog.len(), 2);
        let found = catalog
            .get("VitalSignService", "distinct_values")
            .expect("registered operation");
        assert_eq!(
            found.naming,
            CacheNaming::Manual { name_arg: Some(1) }
        );
        assert!(catalog.get("VitalSignService", "missing").is_none());
    }

    #[test]
    fn lookup_accepts_runtime_names() {
        let catalog =
            OperationCatalog::from_descriptors([OperationDescriptor::new(VITALS, "summary", 1)])
                .expect("catalog");
        let owner = String::from("VitalSignService");
        let operation = format!("sum{}", "mary");

        let found = catalog.get(&owner, &operation).expect("registered operation");
        assert_eq!(found.name, "summary");
        assert!(catalog.get(&owner, "Summary").is_none());
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = OperationCatalog::from_descriptors([
            OperationDescriptor::new(VITALS, "summary", 1),
            OperationDescriptor::new(VITALS, "summary", 2),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::Duplicate {
                owner: "VitalSignService",
                operation: "summary"
            }
        );
    }

    #[test]
    fn name_argument_must_be_within_arity() {
        let err = OperationCatalog::from_descriptors([OperationDescriptor::new(
            VITALS,
            "distinct_values",
            1,
        )
        .named_by_arg(1)])
        .unwrap_err();
        assert!(matches!(err, CatalogError::NameArgOutOfRange { index: 1, arity: 1, .. }));
    }

    #[test]
    fn manual_naming_without_argument_is_accepted() {
        let catalog = OperationCatalog::from_descriptors([OperationDescriptor::new(
            VITALS,
            "distinct_values",
            1,
        )
        .manually_named()])
        .expect("catalog");
        assert!(!catalog.is_empty());
    }

    #[test]
    fn empty_names_are_rejected() {
        let err = OperationCatalog::from_descriptors([OperationDescriptor::new(
            OwnerDescriptor::new(""),
            "summary",
            0,
        )])
        .unwrap_err();
        assert!(matches!(err, CatalogError::EmptyName { .. }));
    }
}
