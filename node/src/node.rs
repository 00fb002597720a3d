//! Full node implementation

use crate::api::start_api_server;
use crate::runtime::NodeRuntime;
use landreg_core::{NodeConfig, RegistryResult, StorageBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

/// Full LANDREG node
pub struct LandregNode {
    runtime: Arc<NodeRuntime>,
}

impl LandregNode {
    /// Create a new node
    pub fn new(config: NodeConfig) -> RegistryResult<Self> {
        let runtime = Arc::new(NodeRuntime::new(config)?);
        Ok(Self { runtime })
    }

    /// Start the node and serve until ctrl-c
    pub async fn start(&self) -> anyhow::Result<()> {
        info!("Starting LANDREG node...");

        self.runtime.initialize().await?;

        // Start API server
        let api_runtime = self.runtime.clone();
        let api_addr = self.runtime.config().api.listen_addr.clone();

        let api_handle = tokio::spawn(async move {
            if let Err(e) = start_api_server(api_runtime, &api_addr).await {
                error!("API server error: {}", e);
            }
        });

        let status = self.runtime.status()?;
        info!("Node started successfully");
        info!("Node name: {}", status.name);
        info!("Storage backend: {}", status.backend);
        info!("Records: {} at height {}", status.records, status.height);

        // Wait for shutdown signal
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, stopping node...");
            }
            Err(e) => {
                error!("Error waiting for shutdown signal: {}", e);
            }
        }

        api_handle.abort();

        info!("Node stopped");

        Ok(())
    }

    /// Get runtime reference
    pub fn runtime(&self) -> &Arc<NodeRuntime> {
        &self.runtime
    }
}

/// Node builder for easier configuration
pub struct NodeBuilder {
    config: NodeConfig,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self {
            config: NodeConfig::default(),
        }
    }

    pub fn config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_addr(mut self, addr: &str) -> Self {
        self.config.api.listen_addr = addr.to_string();
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    pub fn backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage.backend = backend;
        self
    }

    pub fn seed_on_start(mut self) -> Self {
        self.config.registry.seed_on_start = true;
        self
    }

    pub fn build(self) -> RegistryResult<LandregNode> {
        LandregNode::new(self.config)
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
