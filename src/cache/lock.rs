use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

/// Take a read guard on a partition, recovering the guard if a writer panicked.
pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    partition: &str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), partition, op, "rwlock.read")
}

/// Take a write guard on a partition, recovering the guard if a writer panicked.
pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    partition: &str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), partition, op, "rwlock.write")
}

fn recover<G>(
    result: LockResult<G>,
    partition: &str,
    op: &'static str,
    lock_kind: &'static str,
) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            op,
            namespace = partition,
            lock_kind,
            result = "poisoned_recovered",
            hint = "cached entries may be stale after a panic in another thread",
            "Recovered from poisoned cache partition lock"
        );
        poisoned.into_inner()
    })
}
