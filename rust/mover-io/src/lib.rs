//! I/O abstractions consumed by the mover write path:
//! - `Channel`: positioned writer against the backing store of a transfer.
//! - `ExtentAllocator`: grows the backing space reserved for a transfer.
//!
//! Provides a couple of simple implementations: memory-based, file-based and
//! pool-accounted.

use std::sync::Arc;

pub mod allocator;
pub mod file;
pub mod memory;
pub mod utils;

pub use allocator::{NoopAllocator, PoolAllocator};
pub use file::{FileAllocator, FileChannel};
pub use memory::MemoryChannel;

/// A conceptual file that supports writing at arbitrary positions.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a channel is shared between the
/// transfer table and the threads dispatching requests against it.
///
/// **NOTE**: uncoordinated concurrent writes to overlapping regions may have
/// unspecified effects on the content of the underlying storage.
pub trait Channel: Send + Sync + 'static {
    /// Writes `buf` at `pos`, expanding the underlying storage if necessary.
    ///
    /// Performs a single write attempt and returns the number of bytes that
    /// were actually written, which may be less than `buf.len()`.
    fn write_at(&self, pos: u64, buf: &[u8]) -> std::io::Result<usize>;

    /// Returns the current size of the underlying object.
    fn size(&self) -> std::io::Result<u64>;

    /// Flushes written data to durable storage.
    fn sync(&self) -> std::io::Result<()>;

    /// Retrieves the storage profile associated with this channel.
    fn storage_profile(&self) -> StorageProfile;
}

/// Reserves backing physical space for a transfer.
pub trait ExtentAllocator: Send + Sync + 'static {
    /// Reserves `amount` additional bytes on top of what was reserved so far.
    ///
    /// Out-of-space conditions are reported as [`std::io::ErrorKind::StorageFull`].
    fn reserve(&self, amount: u64) -> std::io::Result<()>;
}

/// Characterizes the performance aspects of the underlying storage implementation.
#[derive(Debug, Clone)]
pub struct StorageProfile {
    /// Suggested minimum size for an effective I/O request.
    pub min_io_size: usize,

    /// Suggested maximum size for a single I/O request.
    pub max_io_size: usize,
}

impl StorageProfile {
    /// Clamps a given I/O size to the recommended range defined by this profile.
    ///
    /// The minimum size is guaranteed to be at least 1, and the maximum size is
    /// guaranteed to be at least the minimum size.
    pub fn clamp_io_size(&self, size: usize) -> usize {
        let min = self.min_io_size.max(1).min(self.max_io_size);
        let max = self.max_io_size.max(1).max(min);
        size.clamp(min, max)
    }
}

impl Default for StorageProfile {
    fn default() -> StorageProfile {
        Self {
            min_io_size: 4 * 1024,
            max_io_size: 1024 * 1024,
        }
    }
}

impl<T> Channel for Arc<T>
where
    T: Channel + ?Sized,
{
    fn write_at(&self, pos: u64, buf: &[u8]) -> std::io::Result<usize> {
        self.as_ref().write_at(pos, buf)
    }

    fn size(&self) -> std::io::Result<u64> {
        self.as_ref().size()
    }

    fn sync(&self) -> std::io::Result<()> {
        self.as_ref().sync()
    }

    fn storage_profile(&self) -> StorageProfile {
        self.as_ref().storage_profile()
    }
}

impl<T> ExtentAllocator for Arc<T>
where
    T: ExtentAllocator + ?Sized,
{
    fn reserve(&self, amount: u64) -> std::io::Result<()> {
        self.as_ref().reserve(amount)
    }
}
