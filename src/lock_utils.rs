//! Lock poisoning recovery for the shared packet tables.
//!
//! A shard mutex becomes poisoned when a thread panics while holding it.
//! The filter must keep rendering decisions even then: a per-source
//! counter that is slightly stale is acceptable, a filter that stops
//! answering is not. These helpers log the poisoning event and recover
//! the guard so packet processing continues in a degraded mode.

use std::sync::{Mutex, MutexGuard};
use tracing::error;

/// Acquire a Mutex lock, recovering from poisoning if necessary.
///
/// If the lock is poisoned, logs an error and returns the recovered
/// guard. The protected table may hold stale per-source state after
/// recovery; entry structure itself is never corrupted because every
/// mutation happens under the lock.
///
/// # Arguments
/// * `mutex` - The Mutex to lock
/// * `context` - A description of what the lock protects (for logging)
pub fn lock_or_recover<'a, T>(mutex: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            error!(
                "Mutex poisoned for '{}' - recovering with potentially stale data",
                context
            );
            poisoned.into_inner()
        }
    }
}
