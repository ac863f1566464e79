use std::{
    fs::{File, OpenOptions},
    path::Path,
    sync::{Arc, Mutex},
};

use crate::{Channel, ExtentAllocator, StorageProfile, verify};

/// A [`Channel`] over a regular file, writing with positioned I/O.
#[derive(Clone)]
pub struct FileChannel {
    file: Arc<File>,
}

impl FileChannel {
    pub fn new(file: impl Into<Arc<File>>) -> FileChannel {
        FileChannel { file: file.into() }
    }

    /// Opens `path` for writing, creating it if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<FileChannel> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        Ok(FileChannel::new(file))
    }

    pub fn inner(&self) -> &Arc<File> {
        &self.file
    }
}

impl Channel for FileChannel {
    fn write_at(&self, pos: u64, buf: &[u8]) -> std::io::Result<usize> {
        file_write_at(&self.file, pos, buf)
    }

    fn size(&self) -> std::io::Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn sync(&self) -> std::io::Result<()> {
        self.file.sync_data()
    }

    fn storage_profile(&self) -> StorageProfile {
        StorageProfile {
            min_io_size: 16 * 1024,
            max_io_size: 1024 * 1024,
        }
    }
}

/// An [`ExtentAllocator`] that preallocates blocks of the backing file.
///
/// The visible file size is left untouched; only the reserved extent grows.
/// On platforms (or filesystems) without preallocation support the
/// reservation is only tracked.
pub struct FileAllocator {
    file: Arc<File>,
    reserved: Mutex<u64>,
}

impl FileAllocator {
    /// Creates an allocator for `file` whose extent currently covers `reserved` bytes.
    pub fn new(file: Arc<File>, reserved: u64) -> FileAllocator {
        FileAllocator {
            file,
            reserved: Mutex::new(reserved),
        }
    }

    /// Returns the number of bytes reserved so far.
    pub fn reserved(&self) -> u64 {
        *self
            .reserved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ExtentAllocator for FileAllocator {
    fn reserve(&self, amount: u64) -> std::io::Result<()> {
        let mut reserved = self
            .reserved
            .lock()
            .map_err(|_| std::io::Error::other("file allocator lock poisoned"))?;
        let end = reserved.checked_add(amount);
        verify!(end.is_some_and(|end| end <= i64::MAX as u64));
        preallocate(&self.file, *reserved, amount)?;
        *reserved += amount;
        log::trace!("file extent reserved up to {}", *reserved);
        Ok(())
    }
}

#[cfg(target_os = "linux")]
fn preallocate(file: &File, offset: u64, len: u64) -> std::io::Result<()> {
    use std::os::fd::AsRawFd;

    if len == 0 {
        return Ok(());
    }
    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    let rc = unsafe {
        libc::fallocate(
            file.as_raw_fd(),
            libc::FALLOC_FL_KEEP_SIZE,
            offset as libc::off_t,
            len as libc::off_t,
        )
    };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EOPNOTSUPP) => Ok(()),
        Some(libc::ENOSPC) => Err(std::io::Error::new(std::io::ErrorKind::StorageFull, err)),
        Some(libc::EDQUOT) => Err(std::io::Error::new(std::io::ErrorKind::QuotaExceeded, err)),
        _ => Err(err),
    }
}

#[cfg(not(target_os = "linux"))]
fn preallocate(_file: &File, _offset: u64, _len: u64) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
pub fn file_write_at(file: &File, pos: u64, buf: &[u8]) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;

    file.write_at(buf, pos)
}

#[cfg(windows)]
pub fn file_write_at(file: &File, pos: u64, buf: &[u8]) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;

    file.seek_write(buf, pos)
}
