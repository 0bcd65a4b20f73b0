//! Permission tags declared by cache owners and the evaluator seam.
//!
//! Owners declare a required-permission tag as a plain string. The tag is
//! mapped to a [`Permission`] through a fixed table built once per process;
//! a tag missing from the table never maps to anything, and the resolver
//! treats that as a denial.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use uuid::Uuid;

use super::dataset::DatasetIdentity;

pub const VIEW_DATASET_TAG: &str = "dataset:view";
pub const MANAGE_DATASET_TAG: &str = "dataset:manage";

static PERMISSION_TAGS: Lazy<HashMap<&'static str, Permission>> = Lazy::new(|| {
    HashMap::from([
        (VIEW_DATASET_TAG, Permission::ViewDataset),
        (MANAGE_DATASET_TAG, Permission::ManageDataset),
    ])
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewDataset,
    ManageDataset,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ViewDataset => "view_dataset",
            Permission::ManageDataset => "manage_dataset",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up the permission a declared tag stands for.
///
/// Returns `None` for any tag outside the table; callers must deny in that case.
pub fn permission_for_tag(tag: &str) -> Option<Permission> {
    PERMISSION_TAGS.get(tag).copied()
}

/// The caller on whose behalf a cached operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    pub id: Uuid,
    pub name: String,
}

impl Principal {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Authorization backend answering "may this principal do X on these datasets".
pub trait PermissionEvaluator: Send + Sync {
    fn has_permission(
        &self,
        principal: &Principal,
        datasets: &DatasetIdentity,
        permission: Permission,
    ) -> bool;
}

impl<F> PermissionEvaluator for F
where
    F: Fn(&Principal, &DatasetIdentity, Permission) -> bool + Send + Sync,
{
    fn has_permission(
        &self,
        principal: &Principal,
        datasets: &DatasetIdentity,
        permission: Permission,
    ) -> bool {
        self(principal, datasets, permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::Dataset;

    #[test]
    fn recognised_tags_map_to_permissions() {
        assert_eq!(
            permission_for_tag(VIEW_DATASET_TAG),
            Some(Permission::ViewDataset)
        );
        assert_eq!(
            permission_for_tag(MANAGE_DATASET_TAG),
            Some(Permission::ManageDataset)
        );
    }

    #[test]
    fn unknown_tags_map_to_nothing() {
        assert_eq!(permission_for_tag(""), None);
        assert_eq!(permission_for_tag("dataset:delete"), None);
        assert_eq!(permission_for_tag("DATASET:VIEW"), None);
    }

    #[test]
    fn closures_act_as_evaluators() {
        let evaluator = |_: &Principal, datasets: &DatasetIdentity, permission: Permission| {
            permission == Permission::ViewDataset && datasets.len() == 1
        };
        let principal = Principal::new(Uuid::nil(), "analyst");
        let identity = DatasetIdentity::single(Dataset::study(1));

        assert!(evaluator.has_permission(&principal, &identity, Permission::ViewDataset));
        assert!(!evaluator.has_permission(&principal, &identity, Permission::ManageDataset));
    }
}
