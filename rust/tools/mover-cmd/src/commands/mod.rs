//! Command implementations for mover-cmd

use std::sync::Arc;

use anyhow::{Context, Result};
use mover::{IoMode, MoverConfig, MoverRegistry, StateId, WriteSession};
use mover_io::{Channel, ExtentAllocator, FileAllocator, FileChannel, PoolAllocator};
use mover_space::SpacePool;

pub mod replay;
pub mod write;

/// Loads the configuration file if one was given, otherwise the defaults.
pub fn load_config(path: Option<&str>) -> Result<MoverConfig> {
    match path {
        Some(path) => MoverConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {path}")),
        None => Ok(MoverConfig::default()),
    }
}

pub fn show_config(config: &MoverConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// A single write transfer on a local file, registered in its own table.
pub struct LocalTransfer {
    pub id: StateId,
    pub registry: Arc<MoverRegistry>,
    pub channel: Arc<FileChannel>,
    /// Keeps the pool alive for reporting.
    pub pool: Option<SpacePool>,
}

impl LocalTransfer {
    /// Opens `target` for writing and registers a write transfer for it.
    ///
    /// With `pool` the reserved space is accounted against a pool of that
    /// capacity, otherwise the target file itself is preallocated.
    pub fn open(target: &str, pool: Option<u64>) -> Result<LocalTransfer> {
        let channel = Arc::new(
            FileChannel::open(target).with_context(|| format!("Failed to open {target}"))?,
        );
        let existing = channel.size()?;
        let (allocator, pool): (Arc<dyn ExtentAllocator>, Option<SpacePool>) = match pool {
            Some(capacity) => {
                let pool = SpacePool::new(capacity);
                let allocator = PoolAllocator::new(&pool, existing).with_context(|| {
                    format!("Pool of {capacity} bytes cannot hold existing {existing} bytes")
                })?;
                let allocator: Arc<dyn ExtentAllocator> = Arc::new(allocator);
                (allocator, Some(pool))
            }
            None => {
                let allocator: Arc<dyn ExtentAllocator> =
                    Arc::new(FileAllocator::new(channel.inner().clone(), existing));
                (allocator, None)
            }
        };

        let mut other = [0u8; 12];
        other[..4].copy_from_slice(&std::process::id().to_be_bytes());
        let id = StateId::new(1, other);

        let registry = Arc::new(MoverRegistry::new());
        registry.register(WriteSession::new(
            id,
            IoMode::Write,
            channel.clone(),
            allocator,
            existing,
        ));
        log::info!("opened transfer {id} on {target} ({existing} bytes present)");
        Ok(LocalTransfer {
            id,
            registry,
            channel,
            pool,
        })
    }

    /// Returns `(allocated, bytes_transferred)` of the transfer.
    pub fn stats(&self) -> Result<(u64, u64)> {
        use mover::SessionRegistry;

        let session = self
            .registry
            .lookup(&self.id)
            .context("transfer vanished from the registry")?;
        let session = session
            .lock()
            .map_err(|_| anyhow::anyhow!("transfer lock poisoned"))?;
        Ok((session.allocated(), session.bytes_transferred()))
    }
}
