//! Pool space accounting for data movers.
//!
//! A [`SpacePool`] models the free capacity of a storage pool. Every in-flight
//! transfer holds a [`SpaceReservation`] against it that grows as the file grows;
//! the reserved bytes go back to the pool when the reservation is dropped.

use std::sync::Arc;

use counter::Counter;

pub mod counter;

/// A shared pool of backing space that reservations are carved from.
#[derive(Clone)]
pub struct SpacePool(Arc<PoolState>);

struct PoolState {
    capacity: u64,
    free: Counter,
}

impl SpacePool {
    /// Creates a pool with `capacity` bytes of free space.
    pub fn new(capacity: u64) -> SpacePool {
        SpacePool(Arc::new(PoolState {
            capacity,
            free: Counter::new(capacity),
        }))
    }

    pub fn capacity(&self) -> u64 {
        self.0.capacity
    }

    /// Returns the free space remaining in the pool.
    ///
    /// **Note**: intended for diagnostics; the value may be outdated in a
    /// concurrent environment.
    pub fn free(&self) -> u64 {
        self.0.free.read()
    }

    /// Returns the space currently held by reservations.
    pub fn used(&self) -> u64 {
        self.0.capacity.saturating_sub(self.free())
    }

    /// Reserves `amount` bytes from the pool.
    ///
    /// Fails with [`PoolExhausted`] when the pool lacks the requested space.
    pub fn reserve(&self, amount: u64) -> Result<SpaceReservation, PoolExhausted> {
        if self.0.free.withdraw(amount) {
            Ok(SpaceReservation {
                pool: self.0.clone(),
                amount,
            })
        } else {
            Err(PoolExhausted {
                requested: amount,
                free: self.free(),
            })
        }
    }
}

impl std::fmt::Debug for SpacePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpacePool")
            .field("capacity", &self.0.capacity)
            .field("free", &self.free())
            .finish()
    }
}

/// Space held by a single transfer.
///
/// The reserved bytes are returned to the pool when the reservation is dropped.
pub struct SpaceReservation {
    pool: Arc<PoolState>,
    amount: u64,
}

impl SpaceReservation {
    /// Currently reserved amount.
    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Grows the reservation by `additional` bytes.
    ///
    /// On failure the reservation keeps its previous size.
    pub fn grow(&mut self, additional: u64) -> Result<(), PoolExhausted> {
        if !self.pool.free.withdraw(additional) {
            return Err(PoolExhausted {
                requested: additional,
                free: self.pool.free.read(),
            });
        }
        self.amount += additional;
        Ok(())
    }
}

impl Drop for SpaceReservation {
    fn drop(&mut self) {
        if self.amount != 0 {
            self.pool.free.deposit(self.amount);
        }
    }
}

impl std::fmt::Debug for SpaceReservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaceReservation")
            .field("amount", &self.amount)
            .finish_non_exhaustive()
    }
}

/// The pool did not have enough free space to satisfy a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolExhausted {
    pub requested: u64,
    pub free: u64,
}

impl std::fmt::Display for PoolExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pool exhausted: requested {} bytes, {} free",
            self.requested, self.free
        )
    }
}

impl std::error::Error for PoolExhausted {}

impl From<PoolExhausted> for std::io::Error {
    fn from(e: PoolExhausted) -> Self {
        std::io::Error::new(std::io::ErrorKind::StorageFull, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_creation() {
        let pool = SpacePool::new(100);
        assert_eq!(pool.capacity(), 100);
        assert_eq!(pool.free(), 100);
        assert_eq!(pool.used(), 0);
    }

    #[test]
    fn test_reserve_success() {
        let pool = SpacePool::new(100);
        let reservation = pool.reserve(40).unwrap();
        assert_eq!(reservation.amount(), 40);
        assert_eq!(pool.free(), 60);
        assert_eq!(pool.used(), 40);
    }

    #[test]
    fn test_reserve_failure() {
        let pool = SpacePool::new(100);
        let err = pool.reserve(150).unwrap_err();
        assert_eq!(
            err,
            PoolExhausted {
                requested: 150,
                free: 100
            }
        );
        assert_eq!(pool.free(), 100);
    }

    #[test]
    fn test_reservation_drop() {
        let pool = SpacePool::new(100);
        {
            let _reservation = pool.reserve(50).unwrap();
            assert_eq!(pool.free(), 50);
        }
        assert_eq!(pool.free(), 100);
    }

    #[test]
    fn test_grow() {
        let pool = SpacePool::new(100);
        let mut reservation = pool.reserve(0).unwrap();
        reservation.grow(30).unwrap();
        reservation.grow(30).unwrap();
        assert_eq!(reservation.amount(), 60);
        assert_eq!(pool.free(), 40);

        assert!(reservation.grow(50).is_err());
        assert_eq!(reservation.amount(), 60);
        assert_eq!(pool.free(), 40);
    }

    #[test]
    fn test_exhausted_into_io_error() {
        let pool = SpacePool::new(1);
        let err: std::io::Error = pool.reserve(2).unwrap_err().into();
        assert_eq!(err.kind(), std::io::ErrorKind::StorageFull);
    }
}
