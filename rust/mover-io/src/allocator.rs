use std::sync::Mutex;

use mover_space::{SpacePool, SpaceReservation};

use crate::ExtentAllocator;

/// An [`ExtentAllocator`] that accounts reserved space against a shared [`SpacePool`].
///
/// Each transfer owns one `PoolAllocator`; the held space is returned to the
/// pool when the allocator is dropped.
pub struct PoolAllocator {
    reservation: Mutex<SpaceReservation>,
}

impl PoolAllocator {
    /// Creates an allocator for a transfer, reserving `initial` bytes up front.
    pub fn new(pool: &SpacePool, initial: u64) -> std::io::Result<PoolAllocator> {
        let reservation = pool.reserve(initial)?;
        Ok(PoolAllocator {
            reservation: Mutex::new(reservation),
        })
    }

    /// Returns the number of bytes held by this transfer.
    pub fn reserved(&self) -> u64 {
        self.reservation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .amount()
    }
}

impl ExtentAllocator for PoolAllocator {
    fn reserve(&self, amount: u64) -> std::io::Result<()> {
        let mut reservation = self
            .reservation
            .lock()
            .map_err(|_| std::io::Error::other("pool allocator lock poisoned"))?;
        reservation.grow(amount).map_err(|e| {
            log::warn!("pool space reservation of {amount} bytes failed: {e}");
            std::io::Error::from(e)
        })
    }
}

impl std::fmt::Debug for PoolAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolAllocator")
            .field("reserved", &self.reserved())
            .finish()
    }
}

/// An [`ExtentAllocator`] that grants every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAllocator;

impl ExtentAllocator for NoopAllocator {
    fn reserve(&self, _amount: u64) -> std::io::Result<()> {
        Ok(())
    }
}
