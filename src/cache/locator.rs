//! Dataset locator.
//!
//! Scans a call's arguments left to right and returns the first dataset
//! identity any of them carries. Only the three dataset-bearing shapes of
//! [`CallArg`] are recognised; plain values never contribute an identity.

use crate::domain::dataset::{Dataset, DatasetCollection, DatasetIdentity};

use super::keys::KeyValue;

/// Request wrapper that embeds the datasets it targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedRequest {
    pub datasets: DatasetIdentity,
    pub params: Vec<KeyValue>,
}

impl ScopedRequest {
    pub fn new(datasets: DatasetIdentity, params: Vec<KeyValue>) -> Self {
        Self { datasets, params }
    }
}

/// One argument of a cached call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallArg {
    Request(ScopedRequest),
    Datasets(DatasetCollection),
    Dataset(Dataset),
    Value(KeyValue),
}

impl CallArg {
    /// Identity carried by this argument, if any.
    pub fn dataset_identity(&self) -> Option<DatasetIdentity> {
        match self {
            CallArg::Request(request) => Some(request.datasets.clone()),
            CallArg::Datasets(collection) => Some(collection.identity()),
            CallArg::Dataset(dataset) => Some(DatasetIdentity::single(*dataset)),
            CallArg::Value(_) => None,
        }
    }

    /// Value this argument contributes to a cache key.
    ///
    /// Collections and single datasets both lower to their canonical identity.
    pub fn to_key_value(&self) -> KeyValue {
        match self {
            CallArg::Request(request) => KeyValue::List(vec![
                KeyValue::Datasets(request.datasets.clone()),
                KeyValue::List(request.params.clone()),
            ]),
            CallArg::Datasets(collection) => KeyValue::Datasets(collection.identity()),
            CallArg::Dataset(dataset) => KeyValue::Datasets(DatasetIdentity::single(*dataset)),
            CallArg::Value(value) => value.clone(),
        }
    }

    pub fn as_key_value(&self) -> Option<&KeyValue> {
        match self {
            CallArg::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<ScopedRequest> for CallArg {
    fn from(value: ScopedRequest) -> Self {
        Self::Request(value)
    }
}

impl From<DatasetCollection> for CallArg {
    fn from(value: DatasetCollection) -> Self {
        Self::Datasets(value)
    }
}

impl From<Dataset> for CallArg {
    fn from(value: Dataset) -> Self {
        Self::Dataset(value)
    }
}

impl From<KeyValue> for CallArg {
    fn from(value: KeyValue) -> Self {
        Self::Value(value)
    }
}

/// Return the first dataset identity carried by `args`.
pub fn locate(args: &[CallArg]) -> Option<DatasetIdentity> {
    args.iter().find_map(CallArg::dataset_identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::{DatasetId, DatasetKind};

    fn identity(kind: DatasetKind, ids: &[i64]) -> DatasetIdentity {
        DatasetIdentity::new(kind, ids.iter().copied().map(DatasetId)).expect("identity")
    }

    #[test]
    fn plain_values_yield_nothing() {
        let args = vec![
            CallArg::Value(KeyValue::str("ALT")),
            CallArg::Value(KeyValue::Int(3)),
        ];
        assert_eq!(locate(&args), None);
        assert_eq!(locate(&[]), None);
    }

    #[test]
    fn request_wrapper_yields_embedded_identity() {
        let embedded = identity(DatasetKind::Study, &[4, 5]);
        let args = vec![
            CallArg::Value(KeyValue::Bool(true)),
            CallArg::Request(ScopedRequest::new(embedded.clone(), vec![KeyValue::Id(9)])),
        ];
        assert_eq!(locate(&args), Some(embedded));
    }

    #[test]
    fn collection_is_wrapped_directly() {
        let collection =
            DatasetCollection::new(vec![Dataset::adhoc(2), Dataset::adhoc(1)]).expect("collection");
        let args = vec![CallArg::Datasets(collection)];
        assert_eq!(locate(&args), Some(identity(DatasetKind::Adhoc, &[1, 2])));
    }

    #[test]
    fn single_dataset_becomes_one_element_identity() {
        let args = vec![CallArg::Dataset(Dataset::study(11))];
        assert_eq!(locate(&args), Some(identity(DatasetKind::Study, &[11])));
    }

    #[test]
    fn leftmost_match_wins() {
        let request = ScopedRequest::new(identity(DatasetKind::Study, &[1]), Vec::new());
        let args = vec![
            CallArg::Dataset(Dataset::adhoc(8)),
            CallArg::Request(request),
        ];
        assert_eq!(locate(&args), Some(identity(DatasetKind::Adhoc, &[8])));
    }

    #[test]
    fn locating_is_deterministic() {
        let build = || {
            vec![
                CallArg::Value(KeyValue::str("HGB")),
                CallArg::Datasets(
                    DatasetCollection::new(vec![Dataset::study(3), Dataset::study(1)])
                        .expect("collection"),
                ),
            ]
        };
        assert_eq!(locate(&build()), locate(&build()));
    }
}
