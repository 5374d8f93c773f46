/// Configuration types shared by the backend and embedders of the core.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_DATA_FILE: &str = "taskboard-data.json";

/// Where board data lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process-local; lost on exit.
    Memory,
    /// Whole document rewritten as JSON on every mutation.
    File { path: PathBuf },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::File {
            path: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }
}

impl StorageConfig {
    pub fn mode_name(&self) -> &'static str {
        match self {
            StorageConfig::Memory => "memory",
            StorageConfig::File { .. } => "file",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_json() {
        let cfg: StorageConfig =
            serde_json::from_str(r#"{"mode":"file","path":"/tmp/b.json"}"#).unwrap();
        assert_eq!(
            cfg,
            StorageConfig::File {
                path: PathBuf::from("/tmp/b.json")
            }
        );
        let cfg: StorageConfig = serde_json::from_str(r#"{"mode":"memory"}"#).unwrap();
        assert_eq!(cfg.mode_name(), "memory");
    }
}
