//! Batched Updates
//!
//! A transaction groups several signal writes so that every session they
//! touch is invalidated once, after the outermost transaction ends.

use super::runtime::Runtime;

/// RAII guard that closes the batch even if the closure panics.
///
/// While unwinding, parked invalidations are dropped rather than delivered.
struct BatchGuard;

impl BatchGuard {
    fn enter() -> Self {
        Runtime::begin_batch();
        Self
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            Runtime::abandon_batch();
        } else {
            Runtime::end_batch();
        }
    }
}

/// Entry point for batched writes.
pub struct Transaction;

impl Transaction {
    /// Run `f` as one batch. Transactions nest; only the outermost one
    /// delivers invalidations.
    pub fn run<R>(f: impl FnOnce() -> R) -> R {
        let _guard = BatchGuard::enter();
        f()
    }
}

/// Shorthand for [`Transaction::run`].
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    Transaction::run(f)
}
