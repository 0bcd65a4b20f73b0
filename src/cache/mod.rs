//! Dataset-scoped result cache.
//!
//! Cached operations store their results in namespaces named
//! `{kind prefix}{owner}.{operation}`, keyed by a [`CacheKey`] derived from the
//! call's arguments. Keys derived from dataset-bearing arguments embed the
//! call's [`DatasetIdentity`](crate::domain::dataset::DatasetIdentity), which is
//! what lets [`InvalidationEngine::clear_for_dataset`] drop exactly the entries
//! a dataset change affects.
//!
//! ## Configuration
//!
//! Namespace prefixes and the primed-metadata namespace come from the `[cache]`
//! section of `dataset-cache.toml`:
//!
//! ```toml
//! [cache]
//! study_prefix = "study-"
//! adhoc_prefix = "adhoc-"
//! primed_owner = "DatasetMetadataService"
//! primed_operation = "compute_metadata"
//! ```

mod catalog;
mod config;
mod error;
mod flight;
mod generator;
mod invalidation;
mod keys;
mod locator;
mod lock;
pub mod metrics;
mod namespace;
mod report;
mod resolver;
mod store;

pub use catalog::{CatalogError, OperationCatalog};
pub use config::CacheConfig;
pub(crate) use config::prefixes_overlap;
pub use error::CacheError;
pub use flight::{FlightGuard, InFlightError, InFlightOperations};
pub use generator::{generate_dataset_aware_key, generate_key};
pub use invalidation::{FULL_REFRESH, InvalidationEngine, RefreshOutcome};
pub use keys::{CacheKey, DatasetKey, FloatBits, KeyValue};
pub use locator::{CallArg, ScopedRequest, locate};
pub use namespace::{
    CacheNaming, OperationDescriptor, OwnerDescriptor, resolve_namespace, resolve_operation_name,
};
pub use report::ClearanceReport;
pub use resolver::{CacheResolver, CallContext};
pub use store::{CachePartition, CacheStore, InMemoryCacheStore, InMemoryPartition, StoreError};
