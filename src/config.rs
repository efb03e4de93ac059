//! Harness configuration.
//!
//! Settings are loaded from a YAML file. [`HarnessConfig::load_or_init`]
//! materializes the defaults on first run so deployments always have a file
//! to edit, mirroring how operators seed their target lists.

use crate::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A target seeded from configuration rather than created at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
}

/// Tunables for the harness runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Pause between liveness probe rounds, in milliseconds.
    pub watch_pause_ms: u64,
    /// Response read buffer size per exchange, in bytes.
    pub read_buffer_size: usize,
    /// Per-subscriber event buffer of the notifier.
    pub event_capacity: usize,
    /// Targets to seed into the store at startup.
    pub targets: Vec<TargetConfig>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            watch_pause_ms: 10,
            read_buffer_size: 4096,
            event_capacity: 64,
            targets: vec![TargetConfig {
                name: "default-server".to_string(),
                host: "127.0.0.1".to_string(),
                port: 9000,
            }],
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::config(path, format!("read failed: {e}")))?;
        serde_yaml_ng::from_str(&raw)
            .map_err(|e| HarnessError::config(path, format!("parse failed: {e}")))
    }

    /// Load configuration, writing and returning the defaults when the file
    /// does not exist yet.
    pub fn load_or_init(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        let raw = serde_yaml_ng::to_string(&config)
            .map_err(|e| HarnessError::config(path, format!("serialize failed: {e}")))?;
        std::fs::write(path, raw)
            .map_err(|e| HarnessError::config(path, format!("write failed: {e}")))?;
        info!(path = %path.display(), "wrote default configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn scratch_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("wirebench-{tag}-{}.yaml", std::process::id()))
    }

    #[test]
    fn defaults_are_usable() {
        let config = HarnessConfig::default();
        assert_eq!(config.watch_pause_ms, 10);
        assert_eq!(config.read_buffer_size, 4096);
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.targets[0].port, 9000);
    }

    #[test]
    fn yaml_roundtrip() -> Result<()> {
        let config = HarnessConfig {
            watch_pause_ms: 25,
            read_buffer_size: 1024,
            event_capacity: 8,
            targets: vec![TargetConfig {
                name: "edge".into(),
                host: "10.0.0.5".into(),
                port: 7700,
            }],
        };
        let yaml = serde_yaml_ng::to_string(&config)?;
        let back: HarnessConfig = serde_yaml_ng::from_str(&yaml)?;
        assert_eq!(back, config);
        Ok(())
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() -> Result<()> {
        let config: HarnessConfig = serde_yaml_ng::from_str("watch_pause_ms: 50\n")?;
        assert_eq!(config.watch_pause_ms, 50);
        assert_eq!(config.read_buffer_size, 4096);
        Ok(())
    }

    #[test]
    fn load_or_init_materializes_defaults() -> Result<()> {
        let path = scratch_path("init");
        let _ = std::fs::remove_file(&path);

        let first = HarnessConfig::load_or_init(&path)?;
        assert_eq!(first, HarnessConfig::default());
        assert!(path.exists());

        let second = HarnessConfig::load_or_init(&path)?;
        assert_eq!(second, first);

        std::fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn load_rejects_malformed_files() -> Result<()> {
        let path = scratch_path("broken");
        std::fs::write(&path, ": not yaml :\n")?;
        assert!(matches!(
            HarnessConfig::load(&path),
            Err(HarnessError::Config { .. })
        ));
        std::fs::remove_file(&path)?;
        Ok(())
    }
}
