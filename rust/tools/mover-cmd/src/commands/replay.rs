//! Replay command implementation

use anyhow::{Context, Result};
use mover::{
    MoverConfig, StableHow, WriteHandler,
    nfs4::{DataServer, Write4Args, Write4Res},
};
use serde::{Deserialize, Serialize};

use crate::commands::LocalTransfer;

/// One entry of a replay script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedWrite {
    pub offset: u64,
    /// Number of bytes to write.
    pub len: usize,
    /// Fill byte for the payload.
    #[serde(default)]
    pub fill: u8,
    /// Requested `stable_how4` value.
    #[serde(default)]
    pub stable: u32,
}

#[derive(Debug, Serialize)]
struct ReplayEntry {
    offset: u64,
    requested: usize,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<u32>,
}

#[derive(Serialize)]
struct ReplaySummary {
    stateid: String,
    writeverf: String,
    allocated: u64,
    transferred: u64,
    entries: Vec<ReplayEntry>,
}

pub fn parse_script(text: &str) -> Result<Vec<ScriptedWrite>> {
    let script: Vec<ScriptedWrite> = serde_json::from_str(text)?;
    for (i, write) in script.iter().enumerate() {
        if StableHow::from_u32(write.stable).is_none() {
            anyhow::bail!("Entry {i}: invalid stable_how value {}", write.stable);
        }
    }
    Ok(script)
}

pub fn run(config: &MoverConfig, script: String, pool: Option<u64>, target: String) -> Result<()> {
    let text = std::fs::read_to_string(&script)
        .with_context(|| format!("Failed to read script {script}"))?;
    let writes = parse_script(&text).with_context(|| format!("Invalid script {script}"))?;

    let transfer = LocalTransfer::open(&target, pool)?;
    let server = DataServer::new(WriteHandler::new(transfer.registry.clone(), config)?);

    let mut entries = Vec::with_capacity(writes.len());
    for write in writes {
        let args = Write4Args {
            stateid: transfer.id,
            offset: write.offset,
            stable: StableHow::from_u32(write.stable).unwrap_or(StableHow::Unstable),
            data: vec![write.fill; write.len],
        };
        let res = server.write(&args);
        let count = match &res {
            Write4Res::Ok(ok) => Some(ok.count),
            Write4Res::Err(_) => None,
        };
        entries.push(ReplayEntry {
            offset: write.offset,
            requested: write.len,
            status: format!("{:?}", res.status()),
            count,
        });
    }

    let (allocated, transferred) = transfer.stats()?;
    let summary = ReplaySummary {
        stateid: transfer.id.to_string(),
        writeverf: server
            .verifier()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect(),
        allocated,
        transferred,
        entries,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script = parse_script(
            r#"[{"offset": 0, "len": 4096, "fill": 65}, {"offset": 4096, "len": 10, "stable": 2}]"#,
        )
        .unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script[0].fill, 65);
        assert_eq!(script[0].stable, 0);
        assert_eq!(script[1].stable, 2);
    }

    #[test]
    fn test_parse_script_rejects_bad_stable() {
        assert!(parse_script(r#"[{"offset": 0, "len": 1, "stable": 7}]"#).is_err());
        assert!(parse_script(r#"[{"offset": 0}]"#).is_err());
    }
}
