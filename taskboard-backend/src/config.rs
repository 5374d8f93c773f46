/// Configuration for the task board server.
/// Reads config.json from ~/.config/taskboard/config.json (or platform equivalent),
/// then applies environment overrides.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use taskboard_core::config::StorageConfig;
use taskboard_core::reorder::ReorderPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub reorder_policy: ReorderPolicy,
}

fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            storage: StorageConfig::default(),
            reorder_policy: ReorderPolicy::default(),
        }
    }
}

/// `$TASKBOARD_CONFIG`, else ~/.config/taskboard/config.json
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("TASKBOARD_CONFIG") {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskboard")
        .join("config.json")
}

/// Load config from path. Returns default if the file doesn't exist or can't be parsed.
pub fn load_config(path: &Path) -> ServerConfig {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!(target: "taskboard.config", "Failed to parse config {}: {}", path.display(), e);
            ServerConfig::default()
        }),
        Err(_) => {
            log::info!(target: "taskboard.config", "No config at {}, using defaults", path.display());
            ServerConfig::default()
        }
    }
}

/// Apply `PORT`, `TASKBOARD_BIND`, `TASKBOARD_DATA` and `TASKBOARD_STORAGE`.
/// `lookup` is `std::env::var` in production.
pub fn apply_overrides(config: &mut ServerConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(port) = lookup("PORT") {
        match port.parse() {
            Ok(port) => config.port = port,
            Err(_) => log::warn!(target: "taskboard.config", "Ignoring invalid PORT={}", port),
        }
    }
    if let Some(bind) = lookup("TASKBOARD_BIND").filter(|b| !b.is_empty()) {
        config.bind_address = bind;
    }
    if let Some(path) = lookup("TASKBOARD_DATA").filter(|p| !p.is_empty()) {
        config.storage = StorageConfig::File {
            path: PathBuf::from(path),
        };
    }
    if lookup("TASKBOARD_STORAGE").as_deref() == Some("memory") {
        config.storage = StorageConfig::Memory;
    }
}

pub fn load_from_env() -> ServerConfig {
    let mut config = load_config(&default_config_path());
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    config
}
