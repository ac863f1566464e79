use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe byte counter that lets multiple reservations withdraw (if possible)
/// and return space, keeping the counter value non-negative.
pub struct Counter(AtomicU64);

impl Counter {
    /// Creates a new `Counter` holding `bytes`.
    pub fn new(bytes: u64) -> Counter {
        Counter(AtomicU64::new(bytes))
    }

    /// Attempts to withdraw `bytes` from the counter.
    ///
    /// If the current value is at least `bytes`, it is subtracted and `true` is
    /// returned. Otherwise the counter is left untouched and `false` is returned.
    ///
    /// Concurrent withdrawals race through compare-and-exchange, so the counter
    /// never goes below zero.
    pub fn withdraw(&self, bytes: u64) -> bool {
        let mut current = self.0.load(Ordering::Relaxed);
        while current >= bytes {
            match self.0.compare_exchange_weak(
                current,
                current - bytes,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(updated) => current = updated,
            }
        }
        false
    }

    /// Returns `bytes` to the counter.
    pub fn deposit(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::Release);
    }

    /// Returns the counter value (most likely stale by the time it is observed by the caller).
    pub fn read(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}
