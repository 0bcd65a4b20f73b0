//! Dataset identity: which datasets, and of which kind, a call concerns.
//!
//! Every dataset belongs to exactly one [`DatasetKind`]. A [`DatasetIdentity`]
//! is the canonical, immutable form the cache works with: a non-empty set of
//! ids that all share one kind. Callers usually hand in a [`Dataset`] or a
//! [`DatasetCollection`] and the cache derives the identity from it.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// The two mutually exclusive dataset categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Curated study datasets, refreshed wholesale by the daily full refresh.
    Study,
    /// Ad-hoc datasets assembled by users.
    Adhoc,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::Study, DatasetKind::Adhoc];

    pub fn as_str(self) -> &'static str {
        match self {
            DatasetKind::Study => "study",
            DatasetKind::Adhoc => "adhoc",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "study" => Ok(DatasetKind::Study),
            "adhoc" => Ok(DatasetKind::Adhoc),
            other => Err(DomainError::validation(format!(
                "unknown dataset kind `{other}` (expected `study` or `adhoc`)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(pub i64);

impl DatasetId {
    /// Placeholder id used when a namespace has to be named without a real dataset.
    pub const SENTINEL: DatasetId = DatasetId(-1);

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single dataset as passed by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub kind: DatasetKind,
}

impl Dataset {
    pub fn new(id: DatasetId, kind: DatasetKind) -> Self {
        Self { id, kind }
    }

    pub fn study(id: i64) -> Self {
        Self::new(DatasetId(id), DatasetKind::Study)
    }

    pub fn adhoc(id: i64) -> Self {
        Self::new(DatasetId(id), DatasetKind::Adhoc)
    }
}

/// Non-empty collection of datasets that all share one kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetCollection {
    kind: DatasetKind,
    datasets: Vec<Dataset>,
}

impl DatasetCollection {
    pub fn new(datasets: Vec<Dataset>) -> Result<Self, DomainError> {
        let Some(first) = datasets.first() else {
            return Err(DomainError::validation(
                "dataset collection must contain at least one dataset",
            ));
        };
        let kind = first.kind;
        if let Some(mismatch) = datasets.iter().find(|dataset| dataset.kind != kind) {
            return Err(DomainError::validation(format!(
                "dataset collection mixes kinds: dataset {} is {} but collection is {}",
                mismatch.id, mismatch.kind, kind
            )));
        }
        Ok(Self { kind, datasets })
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn identity(&self) -> DatasetIdentity {
        DatasetIdentity {
            kind: self.kind,
            ids: self.datasets.iter().map(|dataset| dataset.id).collect(),
        }
    }
}

/// Immutable value naming a non-empty set of dataset ids of one kind.
///
/// Ids are kept in a `BTreeSet`, so equality ignores the order the caller
/// supplied them in while `Display` always renders them ascending.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DatasetIdentity {
    kind: DatasetKind,
    ids: BTreeSet<DatasetId>,
}

impl DatasetIdentity {
    pub fn new(
        kind: DatasetKind,
        ids: impl IntoIterator<Item = DatasetId>,
    ) -> Result<Self, DomainError> {
        let ids: BTreeSet<DatasetId> = ids.into_iter().collect();
        if ids.is_empty() {
            return Err(DomainError::validation(
                "dataset identity must name at least one dataset",
            ));
        }
        Ok(Self { kind, ids })
    }

    pub fn single(dataset: Dataset) -> Self {
        Self {
            kind: dataset.kind,
            ids: BTreeSet::from([dataset.id]),
        }
    }

    pub fn sentinel(kind: DatasetKind) -> Self {
        Self::single(Dataset::new(DatasetId::SENTINEL, kind))
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn ids(&self) -> &BTreeSet<DatasetId> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: DatasetId) -> bool {
        self.ids.contains(&id)
    }

    /// True when both identities share a kind and at least one dataset id.
    pub fn overlaps(&self, other: &DatasetIdentity) -> bool {
        self.kind == other.kind && !self.ids.is_disjoint(&other.ids)
    }
}

impl From<Dataset> for DatasetIdentity {
    fn from(dataset: Dataset) -> Self {
        Self::single(dataset)
    }
}

impl From<&DatasetCollection> for DatasetIdentity {
    fn from(collection: &DatasetCollection) -> Self {
        collection.identity()
    }
}

impl fmt::Display for DatasetIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.kind)?;
        for (index, id) in self.ids.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{id}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[i64]) -> Vec<DatasetId> {
        values.iter().copied().map(DatasetId).collect()
    }

    #[test]
    fn identity_equality_ignores_input_order() {
        let a = DatasetIdentity::new(DatasetKind::Study, ids(&[3, 1, 2])).expect("identity");
        let b = DatasetIdentity::new(DatasetKind::Study, ids(&[1, 2, 3, 2])).expect("identity");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "study[1,2,3]");
    }

    #[test]
    fn identity_equality_respects_kind() {
        let a = DatasetIdentity::new(DatasetKind::Study, ids(&[1])).expect("identity");
        let b = DatasetIdentity::new(DatasetKind::Adhoc, ids(&[1])).expect("identity");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_identity_is_rejected() {
        let err = DatasetIdentity::new(DatasetKind::Adhoc, Vec::new()).unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn overlap_requires_shared_id_and_kind() {
        let a = DatasetIdentity::new(DatasetKind::Study, ids(&[1, 2])).expect("identity");
        let b = DatasetIdentity::new(DatasetKind::Study, ids(&[2, 9])).expect("identity");
        let c = DatasetIdentity::new(DatasetKind::Study, ids(&[3])).expect("identity");
        let d = DatasetIdentity::new(DatasetKind::Adhoc, ids(&[1, 2])).expect("identity");

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn collection_rejects_mixed_kinds() {
        let err = DatasetCollection::new(vec![Dataset::study(1), Dataset::adhoc(2)]).unwrap_err();
        assert!(err.to_string().contains("mixes kinds"));
    }

    #[test]
    fn collection_rejects_empty_input() {
        assert!(DatasetCollection::new(Vec::new()).is_err());
    }

    #[test]
    fn collection_identity_collapses_duplicates() {
        let collection =
            DatasetCollection::new(vec![Dataset::adhoc(7), Dataset::adhoc(4), Dataset::adhoc(7)])
                .expect("collection");
        let identity = collection.identity();
        assert_eq!(identity.kind(), DatasetKind::Adhoc);
        assert_eq!(identity.len(), 2);
        assert_eq!(identity.to_string(), "adhoc[4,7]");
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Study".parse::<DatasetKind>(), Ok(DatasetKind::Study));
        assert_eq!(" adhoc ".parse::<DatasetKind>(), Ok(DatasetKind::Adhoc));
        assert!("pooled".parse::<DatasetKind>().is_err());
    }
}
