//! Configuration types for LANDREG

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::traits::RegistryResult;

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node name for logging
    pub name: String,

    /// Data directory
    pub data_dir: PathBuf,

    /// World state storage
    pub storage: StorageConfig,

    /// API configuration
    pub api: ApiConfig,

    /// Record store behaviour
    pub registry: RegistryConfig,

    /// Logging level, used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "landreg-node".to_string(),
            data_dir: PathBuf::from("./data"),
            storage: StorageConfig::default(),
            api: ApiConfig::default(),
            registry: RegistryConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// Load from a JSON file. Missing sections keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> RegistryResult<Self> {
        serde_json::from_str(json).map_err(|e| RegistryError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> RegistryResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| RegistryError::Config(e.to_string()))
    }

    /// Directory used by the sled backend
    pub fn state_path(&self) -> PathBuf {
        match &self.storage.path {
            Some(path) => path.clone(),
            None => self.data_dir.join("world_state"),
        }
    }
}

/// World state backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile in-process store
    #[default]
    Memory,
    /// sled database under the data directory
    Sled,
}

impl std::str::FromStr for StorageBackend {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sled" => Ok(StorageBackend::Sled),
            other => Err(RegistryError::Config(format!("unknown storage backend: {}", other))),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => f.write_str("memory"),
            StorageBackend::Sled => f.write_str("sled"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Overrides `<data_dir>/world_state`
    pub path: Option<PathBuf>,
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API listen address
    pub listen_addr: String,

    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            enable_cors: true,
        }
    }
}

/// What `create_record` does when the key already holds a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreatePolicy {
    /// Replace the stored record without warning
    #[default]
    Overwrite,
    /// Fail with `AlreadyExists`
    RejectExisting,
}

/// How single-record reads treat malformed stored values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// Surface a `Decode` error
    #[default]
    Strict,
    /// Substitute an all-empty record
    Lenient,
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    pub create_policy: CreatePolicy,

    pub decode_policy: DecodePolicy,

    /// Seed the demonstration records at boot when the ledger is empty
    pub seed_on_start: bool,
}
