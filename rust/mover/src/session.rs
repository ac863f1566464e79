use std::{fmt, sync::Arc, time::SystemTime};

use mover_io::{Channel, ExtentAllocator};

/// Opaque transfer token supplied by the client with every I/O request.
///
/// Laid out as an NFSv4.1 `stateid4`: a 4-byte sequence id followed by
/// 12 opaque bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct StateId([u8; StateId::SIZE]);

impl StateId {
    pub const SIZE: usize = 16;

    pub fn new(seqid: u32, other: [u8; 12]) -> StateId {
        let mut bytes = [0u8; Self::SIZE];
        bytes[..4].copy_from_slice(&seqid.to_be_bytes());
        bytes[4..].copy_from_slice(&other);
        StateId(bytes)
    }

    pub fn from_bytes(bytes: [u8; StateId::SIZE]) -> StateId {
        StateId(bytes)
    }

    pub fn seqid(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn other(&self) -> &[u8] {
        &self.0[4..]
    }

    pub fn as_bytes(&self) -> &[u8; StateId::SIZE] {
        &self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateId({self})")
    }
}

/// Direction a transfer was opened for. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMode {
    Read,
    Write,
}

/// An in-flight transfer bound to a [`StateId`].
///
/// Sessions are created and torn down by the owner of the transfer table.
/// The write path only mutates the allocated extent size and the transfer
/// accounting.
pub struct WriteSession {
    id: StateId,
    io_mode: IoMode,
    channel: Arc<dyn Channel>,
    allocator: Arc<dyn ExtentAllocator>,
    /// Size of the backing extent reserved so far. Never decreases.
    allocated: u64,
    bytes_transferred: u64,
    last_transferred: Option<SystemTime>,
}

impl WriteSession {
    /// Creates a session whose backing extent already covers `allocated` bytes.
    pub fn new(
        id: StateId,
        io_mode: IoMode,
        channel: Arc<dyn Channel>,
        allocator: Arc<dyn ExtentAllocator>,
        allocated: u64,
    ) -> WriteSession {
        WriteSession {
            id,
            io_mode,
            channel,
            allocator,
            allocated,
            bytes_transferred: 0,
            last_transferred: None,
        }
    }

    pub fn id(&self) -> &StateId {
        &self.id
    }

    pub fn io_mode(&self) -> IoMode {
        self.io_mode
    }

    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    pub fn allocator(&self) -> &Arc<dyn ExtentAllocator> {
        &self.allocator
    }

    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn bytes_transferred(&self) -> u64 {
        self.bytes_transferred
    }

    /// Time of the last successful write, if any.
    pub fn last_transferred(&self) -> Option<SystemTime> {
        self.last_transferred
    }

    pub(crate) fn extend_allocated(&mut self, amount: u64) {
        self.allocated = self.allocated.saturating_add(amount);
    }

    pub(crate) fn record_transfer(&mut self, bytes: u64) {
        self.bytes_transferred += bytes;
        self.last_transferred = Some(SystemTime::now());
    }
}

impl fmt::Debug for WriteSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSession")
            .field("id", &self.id)
            .field("io_mode", &self.io_mode)
            .field("allocated", &self.allocated)
            .field("bytes_transferred", &self.bytes_transferred)
            .finish_non_exhaustive()
    }
}
