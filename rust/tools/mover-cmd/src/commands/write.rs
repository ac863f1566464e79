//! Write command implementation

use anyhow::{Context, Result};
use mover::{MoverConfig, WriteHandler};
use mover_io::Channel;
use serde::Serialize;

use crate::commands::LocalTransfer;

#[derive(Serialize)]
struct WriteSummary {
    stateid: String,
    offset: u64,
    requested: u64,
    transferred: u64,
    writes: usize,
    short_writes: usize,
    allocated: u64,
    file_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pool_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pool_free: Option<u64>,
}

pub fn run(
    config: &MoverConfig,
    input: String,
    offset: u64,
    pool: Option<u64>,
    target: String,
) -> Result<()> {
    let data = std::fs::read(&input).with_context(|| format!("Failed to read {input}"))?;

    let transfer = LocalTransfer::open(&target, pool)?;
    let handler = WriteHandler::new(transfer.registry.clone(), config)?;
    let chunk_size = transfer
        .channel
        .storage_profile()
        .clamp_io_size(data.len());

    let mut writes = 0;
    let mut short_writes = 0;
    let mut pos = offset;
    let mut rest = data.as_slice();
    while !rest.is_empty() {
        let chunk = &rest[..chunk_size.min(rest.len())];
        let outcome = handler
            .handle_write(&transfer.id, pos, chunk)
            .with_context(|| format!("Write at offset {pos} failed"))?;
        writes += 1;
        if outcome.count < chunk.len() {
            short_writes += 1;
        }
        if outcome.count == 0 {
            anyhow::bail!("Channel accepted no bytes at offset {pos}");
        }
        rest = &rest[outcome.count..];
        pos += outcome.count as u64;
    }

    let (allocated, transferred) = transfer.stats()?;
    log::info!("wrote {transferred} bytes to {target} in {writes} writes, extent {allocated}");
    let summary = WriteSummary {
        stateid: transfer.id.to_string(),
        offset,
        requested: data.len() as u64,
        transferred,
        writes,
        short_writes,
        allocated,
        file_size: transfer.channel.size()?,
        pool_used: transfer.pool.as_ref().map(|pool| pool.used()),
        pool_free: transfer.pool.as_ref().map(|pool| pool.free()),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
