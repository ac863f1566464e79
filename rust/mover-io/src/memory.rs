use std::sync::RwLock;

use crate::{Channel, StorageProfile, verify};

/// An in-memory channel backed by a growable buffer, meant for tests and
/// small transfers.
///
/// Writes ending past `limit` fail with `InvalidInput` instead of growing the
/// buffer. `max_write` caps the number of bytes accepted by a single
/// `write_at`, which makes short writes reproducible.
pub struct MemoryChannel {
    data: RwLock<Vec<u8>>,
    limit: u64,
    max_write: Option<usize>,
}

impl MemoryChannel {
    pub const DEFAULT_LIMIT: u64 = 64 * 1024 * 1024;

    pub fn new() -> MemoryChannel {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }

    pub fn with_limit(limit: u64) -> MemoryChannel {
        MemoryChannel {
            data: Default::default(),
            limit,
            max_write: None,
        }
    }

    pub fn with_max_write(max_write: usize) -> MemoryChannel {
        MemoryChannel {
            max_write: Some(max_write),
            ..Self::new()
        }
    }

    /// Returns a copy of the current contents.
    pub fn contents(&self) -> Vec<u8> {
        self.data
            .read()
            .map(|data| data.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for MemoryChannel {
    fn write_at(&self, pos: u64, buf: &[u8]) -> std::io::Result<usize> {
        let len = self.max_write.map_or(buf.len(), |max| buf.len().min(max));
        verify!(pos <= self.limit && len as u64 <= self.limit - pos);
        let pos = usize::try_from(pos)
            .map_err(|_| std::io::Error::from(std::io::ErrorKind::FileTooLarge))?;
        let end = pos
            .checked_add(len)
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::FileTooLarge))?;
        let mut data = self
            .data
            .write()
            .map_err(|_| std::io::Error::other("memory channel lock poisoned"))?;
        if data.len() < end {
            data.resize(end, 0);
        }
        data[pos..end].copy_from_slice(&buf[..len]);
        Ok(len)
    }

    fn size(&self) -> std::io::Result<u64> {
        let data = self
            .data
            .read()
            .map_err(|_| std::io::Error::other("memory channel lock poisoned"))?;
        Ok(data.len() as u64)
    }

    fn sync(&self) -> std::io::Result<()> {
        Ok(())
    }

    fn storage_profile(&self) -> StorageProfile {
        StorageProfile {
            min_io_size: 1,
            ..Default::default()
        }
    }
}
