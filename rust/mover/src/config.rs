//! Mover configuration, loaded from a JSON document.

use std::path::Path;

use mover_common::{Result, error::Error, verify_arg};
use serde::{Deserialize, Serialize};

/// Amount of backing space reserved each time a write runs past the extent.
pub const DEFAULT_ALLOCATION_INCREMENT: u64 = 50 * 1024 * 1024;

/// Largest extent a transfer may grow to; file offsets are signed 64-bit.
pub const MAX_EXTENT: u64 = i64::MAX as u64;

/// How the backing extent is grown when a write ends beyond it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPolicy {
    /// Reserve exactly one increment per write, however far the write
    /// reaches past the extent. A write ending more than one increment past
    /// the current extent proceeds against an under-reserved extent.
    #[default]
    SingleStep,
    /// Reserve as many increments as needed to cover the write.
    Cover,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MoverConfig {
    /// Bytes reserved per growth step.
    pub allocation_increment: u64,
    pub growth_policy: GrowthPolicy,
    /// Sync the channel after every write before acknowledging it.
    pub sync_on_write: bool,
}

impl Default for MoverConfig {
    fn default() -> Self {
        MoverConfig {
            allocation_increment: DEFAULT_ALLOCATION_INCREMENT,
            growth_policy: GrowthPolicy::default(),
            sync_on_write: false,
        }
    }
}

impl MoverConfig {
    /// Reads and validates a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<MoverConfig> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(path.display().to_string(), e))?;
        let config = Self::from_json(&text)?;
        log::debug!("loaded mover config from {}: {config:?}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<MoverConfig> {
        let config: MoverConfig =
            serde_json::from_str(text).map_err(|e| Error::invalid_arg("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        verify_arg!(allocation_increment, self.allocation_increment > 0);
        verify_arg!(
            allocation_increment,
            self.allocation_increment <= MAX_EXTENT
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mover_common::error::ErrorKind;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = MoverConfig::from_json("{}").unwrap();
        assert_eq!(config, MoverConfig::default());
        assert_eq!(config.allocation_increment, 50 * 1024 * 1024);
        assert_eq!(config.growth_policy, GrowthPolicy::SingleStep);
        assert!(!config.sync_on_write);
    }

    #[test]
    fn test_parse() {
        let config = MoverConfig::from_json(
            r#"{"allocation_increment": 4096, "growth_policy": "cover", "sync_on_write": true}"#,
        )
        .unwrap();
        assert_eq!(config.allocation_increment, 4096);
        assert_eq!(config.growth_policy, GrowthPolicy::Cover);
        assert!(config.sync_on_write);
    }

    #[test]
    fn test_rejects_zero_increment() {
        let err = MoverConfig::from_json(r#"{"allocation_increment": 0}"#).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidArgument { name, .. } if name == "allocation_increment"
        ));
    }

    #[test]
    fn test_rejects_oversized_increment() {
        let config = MoverConfig {
            allocation_increment: MAX_EXTENT + 1,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidArgument { name, .. } if name == "allocation_increment"
        ));
    }

    #[test]
    fn test_rejects_unknown_field() {
        let err = MoverConfig::from_json(r#"{"increment": 1}"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mover.json");
        std::fs::write(&path, r#"{"growth_policy": "single_step"}"#).unwrap();
        let config = MoverConfig::load(&path).unwrap();
        assert_eq!(config.growth_policy, GrowthPolicy::SingleStep);

        let err = MoverConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Io { .. }));
    }
}
