//! Administrative invalidation.
//!
//! Clears are synchronous: every call scans the store, mutates what it must and
//! returns a [`ClearanceReport`]. Kind-wide clears drop whole partitions;
//! dataset clears remove only the entries whose embedded datasets overlap the
//! target, because one partition holds results for many dataset combinations.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use tracing::{debug, info, instrument, warn};

use crate::domain::dataset::{DatasetIdentity, DatasetKind};

use super::config::CacheConfig;
use super::error::CacheError;
use super::flight::InFlightOperations;
use super::metrics::{
    METRIC_CLEAR_MS, METRIC_KEYS_REMOVED, METRIC_NAMESPACES_CLEARED, METRIC_REFRESH_SKIPPED,
};
use super::namespace::resolve_namespace;
use super::report::ClearanceReport;
use super::store::{CachePartition, CacheStore, StoreError};

/// In-flight slot held while a full refresh runs.
pub const FULL_REFRESH: &str = "full-refresh";

/// Single-flight slots shared by every engine built with [`InvalidationEngine::new`].
static REFRESH_FLIGHTS: Lazy<InFlightOperations> = Lazy::new(InFlightOperations::new);

/// Result of [`InvalidationEngine::try_full_refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome<T> {
    Completed { report: ClearanceReport, output: T },
    /// Another refresh held the slot; nothing was touched.
    AlreadyInProgress,
}

impl<T> RefreshOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

pub struct InvalidationEngine<S> {
    store: Arc<S>,
    config: CacheConfig,
    in_flight: InFlightOperations,
}

impl<S: CacheStore> InvalidationEngine<S> {
    /// Engine whose full refresh is single-flight across the whole process.
    pub fn new(store: Arc<S>, config: CacheConfig) -> Self {
        Self::with_in_flight(store, config, REFRESH_FLIGHTS.clone())
    }

    /// Engine with its own single-flight slots, shared only with engines
    /// given a clone of `in_flight`.
    pub fn with_in_flight(
        store: Arc<S>,
        config: CacheConfig,
        in_flight: InFlightOperations,
    ) -> Self {
        Self {
            store,
            config,
            in_flight,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn in_flight(&self) -> &InFlightOperations {
        &self.in_flight
    }

    /// Clear every study-prefixed namespace.
    pub fn clear_all(&self) -> Result<ClearanceReport, CacheError> {
        self.clear_kind(DatasetKind::Study)
    }

    /// Clear every adhoc-prefixed namespace.
    pub fn clear_for_adhoc(&self) -> Result<ClearanceReport, CacheError> {
        self.clear_kind(DatasetKind::Adhoc)
    }

    #[instrument(skip(self), fields(kind = %kind))]
    pub fn clear_kind(&self, kind: DatasetKind) -> Result<ClearanceReport, CacheError> {
        let started_at = Instant::now();
        let prefix = self.config.prefix(kind);
        let mut report = ClearanceReport::new();
        let mut removed = 0;

        for name in self.store.partition_names()? {
            if !name.starts_with(prefix) {
                report.mark_retained(name);
                continue;
            }
            removed += self.existing_partition(&name)?.clear()?;
            report.mark_cleared(name);
        }

        self.record_clear(kind.as_str(), &report, removed, started_at);
        info!(
            cleared = report.cleared().len(),
            retained = report.retained().len(),
            keys_removed = removed,
            "Cleared dataset caches by kind"
        );
        Ok(report)
    }

    /// Remove every entry whose datasets overlap `identity`.
    ///
    /// Entries without embedded datasets are never removed. A namespace is
    /// reported cleared when at least one of its entries went.
    #[instrument(skip(self), fields(datasets = %identity))]
    pub fn clear_for_dataset(
        &self,
        identity: &DatasetIdentity,
    ) -> Result<ClearanceReport, CacheError> {
        let started_at = Instant::now();
        let prefix = self.config.prefix(identity.kind());
        let mut report = ClearanceReport::new();
        let mut removed_total = 0;

        for name in self.store.partition_names()? {
            if !name.starts_with(prefix) {
                report.mark_retained(name);
                continue;
            }

            let partition = self.existing_partition(&name)?;
            let mut removed = 0;
            for key in partition.keys()? {
                let overlaps = key
                    .datasets()
                    .is_some_and(|datasets| datasets.overlaps(identity));
                if overlaps && partition.remove(&key)? {
                    debug!(namespace = %name, key = %key, "Removed cache entry");
                    removed += 1;
                }
            }

            if removed > 0 {
                report.mark_cleared(name);
            } else {
                report.mark_retained(name);
            }
            removed_total += removed;
        }

        self.record_clear("dataset", &report, removed_total, started_at);
        info!(
            cleared = report.cleared().len(),
            retained = report.retained().len(),
            keys_removed = removed_total,
            "Cleared dataset cache entries"
        );
        Ok(report)
    }

    /// Clear all study namespaces and run `follow_up`, unless a refresh is
    /// already running.
    ///
    /// The slot is released when this returns, on every path.
    #[instrument(skip_all)]
    pub fn try_full_refresh<T, F>(&self, follow_up: F) -> Result<RefreshOutcome<T>, CacheError>
    where
        F: FnOnce(&ClearanceReport) -> T,
    {
        let Ok(_guard) = self.in_flight.acquire(FULL_REFRESH) else {
            counter!(METRIC_REFRESH_SKIPPED).increment(1);
            warn!("Full refresh already in progress; skipping");
            return Ok(RefreshOutcome::AlreadyInProgress);
        };

        info!("Full refresh started");
        let report = self.clear_all()?;
        let output = follow_up(&report);
        info!(cleared = report.cleared().len(), "Full refresh finished");
        Ok(RefreshOutcome::Completed { report, output })
    }

    /// Datasets recorded in the primed-metadata namespaces of both kinds.
    ///
    /// A primed namespace that was never created simply contributes nothing.
    #[instrument(skip_all)]
    pub fn list_primed_datasets(&self) -> Result<Vec<DatasetIdentity>, CacheError> {
        let mut primed = BTreeSet::new();

        for kind in DatasetKind::ALL {
            let namespace = resolve_namespace(
                &self.config,
                &DatasetIdentity::sentinel(kind),
                self.config.primed_owner(),
                self.config.primed_operation(),
            );
            let Some(partition) = self.store.lookup(&namespace)? else {
                debug!(namespace = %namespace, "Primed namespace not created yet");
                continue;
            };
            primed.extend(
                partition
                    .keys()?
                    .iter()
                    .filter_map(|key| key.datasets().cloned()),
            );
        }

        Ok(primed.into_iter().collect())
    }

    fn existing_partition(&self, name: &str) -> Result<Arc<S::Partition>, StoreError> {
        self.store
            .lookup(name)?
            .ok_or_else(|| StoreError::MissingPartition(name.to_string()))
    }

    fn record_clear(
        &self,
        scope: &'static str,
        report: &ClearanceReport,
        keys_removed: usize,
        started_at: Instant,
    ) {
        counter!(METRIC_KEYS_REMOVED, "scope" => scope).increment(keys_removed as u64);
        counter!(METRIC_NAMESPACES_CLEARED, "scope" => scope)
            .increment(report.cleared().len() as u64);
        histogram!(METRIC_CLEAR_MS, "scope" => scope)
            .record(started_at.elapsed().as_secs_f64() * 1000.0);
    }
}
