//! Poison-tolerant lock acquisition.
//!
//! The cache and controllers share state across tasks behind std locks; a
//! panic while holding one must not wedge every later read. Poisoned locks
//! are recovered and logged, since entries can always be refetched.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

fn note_recovery(op: &'static str, lock_kind: &'static str) {
    warn!(
        op,
        lock_kind,
        result = "poisoned_recovered",
        hint = "cached state may be stale after a panic in another task",
        "Recovered from poisoned lock"
    );
}

pub(crate) fn read_guard<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        note_recovery(op, "rwlock.read");
        poisoned.into_inner()
    })
}

pub(crate) fn write_guard<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        note_recovery(op, "rwlock.write");
        poisoned.into_inner()
    })
}

pub(crate) fn lock_guard<'a, T>(lock: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        note_recovery(op, "mutex.lock");
        poisoned.into_inner()
    })
}
