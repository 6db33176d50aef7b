//! Poison-tolerant lock access: poisoning is logged and the guard recovered.

use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    source: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    recover(lock.read(), source, op, "read")
}

pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    source: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    recover(lock.write(), source, op, "write")
}

fn recover<G>(
    result: LockResult<G>,
    source: &'static str,
    op: &'static str,
    access: &'static str,
) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!(
            source,
            op,
            access,
            "Lock poisoned by a panicking holder; continuing with its last state"
        );
        poisoned.into_inner()
    })
}
