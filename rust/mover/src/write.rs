//! Space allocation and accounting for incoming writes.

use std::sync::Arc;

use mover_common::{Result, error::Error};

use crate::{
    config::{GrowthPolicy, MAX_EXTENT, MoverConfig},
    registry::SessionRegistry,
    session::{IoMode, StateId, WriteSession},
};

/// Commitment level of written data, as enumerated by NFSv4 `stable_how4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StableHow {
    Unstable = 0,
    DataSync = 1,
    FileSync = 2,
}

impl StableHow {
    pub fn from_u32(v: u32) -> Option<Self> {
        match v {
            0 => Some(Self::Unstable),
            1 => Some(Self::DataSync),
            2 => Some(Self::FileSync),
            _ => None,
        }
    }
}

/// Result of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Bytes accepted by the channel; may be fewer than requested.
    pub count: usize,
    /// Always [`StableHow::FileSync`].
    pub committed: StableHow,
}

/// Serves writes against the transfers of a [`SessionRegistry`].
///
/// Every call makes exactly one write attempt on the session's channel.
/// Nothing is retried.
pub struct WriteHandler {
    registry: Arc<dyn SessionRegistry>,
    increment: u64,
    policy: GrowthPolicy,
    sync_on_write: bool,
}

impl WriteHandler {
    pub fn new(registry: Arc<dyn SessionRegistry>, config: &MoverConfig) -> Result<WriteHandler> {
        config.validate()?;
        Ok(WriteHandler {
            registry,
            increment: config.allocation_increment,
            policy: config.growth_policy,
            sync_on_write: config.sync_on_write,
        })
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    pub fn policy(&self) -> GrowthPolicy {
        self.policy
    }

    /// Writes `payload` at `offset` into the transfer registered for `id`.
    ///
    /// Grows the transfer's backing extent first if the write ends past it,
    /// then performs a single positioned write and accounts the bytes the
    /// channel accepted.
    pub fn handle_write(&self, id: &StateId, offset: u64, payload: &[u8]) -> Result<WriteOutcome> {
        log::trace!("write {id}: offset {offset}, {} bytes", payload.len());
        let session = self
            .registry
            .lookup(id)
            .ok_or_else(|| Error::invalid_session(id.to_string()))?;
        let mut session = session
            .lock()
            .map_err(|e| Error::internal("session lock poisoned", e.to_string()))?;

        if session.io_mode() != IoMode::Write {
            return Err(Error::permission(format!(
                "write attempted on a non-write-mode session {id}"
            )));
        }

        let end = offset
            .checked_add(payload.len() as u64)
            .ok_or_else(|| Error::invalid_arg("offset", "offset + count overflows"))?;
        if end > MAX_EXTENT {
            return Err(Error::invalid_arg(
                "offset",
                format!("write ends at {end}, past the maximum extent {MAX_EXTENT}"),
            ));
        }
        self.ensure_allocated(&mut session, end)?;

        let count = session
            .channel()
            .write_at(offset, payload)
            .map_err(|e| Error::io(format!("write {id} at {offset}"), e))?;
        session.record_transfer(count as u64);
        if count < payload.len() {
            log::debug!(
                "short write on {id}: {count} of {} bytes at {offset}",
                payload.len()
            );
        }

        if self.sync_on_write {
            session
                .channel()
                .sync()
                .map_err(|e| Error::io(format!("sync {id}"), e))?;
        }

        Ok(WriteOutcome {
            count,
            committed: StableHow::FileSync,
        })
    }

    /// Grows the extent of `session` for a write ending at `end`.
    ///
    /// `end` is bounded by [`MAX_EXTENT`] and the increment by config
    /// validation, so the covering amount cannot overflow.
    fn ensure_allocated(&self, session: &mut WriteSession, end: u64) -> Result<()> {
        let allocated = session.allocated();
        if end <= allocated {
            return Ok(());
        }
        let steps = match self.policy {
            GrowthPolicy::SingleStep => 1,
            GrowthPolicy::Cover => (end - allocated).div_ceil(self.increment),
        };
        self.grow(session, steps * self.increment)?;
        if end > session.allocated() {
            log::debug!(
                "write on {} ends at {end}, past the reserved extent {}",
                session.id(),
                session.allocated()
            );
        }
        Ok(())
    }

    fn grow(&self, session: &mut WriteSession, amount: u64) -> Result<()> {
        session.allocator().reserve(amount).map_err(|e| {
            log::warn!(
                "failed to grow extent of {} by {amount} bytes: {e}",
                session.id()
            );
            Error::from_reserve(amount, e)
        })?;
        session.extend_allocated(amount);
        log::debug!(
            "extent of {} grown to {} bytes",
            session.id(),
            session.allocated()
        );
        Ok(())
    }
}
