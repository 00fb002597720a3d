//! Node runtime: runs each record store invocation as one ledger transaction

use landreg_core::{
    KeyedRecord, NodeConfig, OwnerReport, PropertyRecord, RegistryError, RegistryResult,
    StorageBackend,
};
use landreg_registry::{Invocation, InvocationOutput, RecordStore};
use landreg_state::{create_memory_state, create_sled_state, TxContext, Version, WorldState};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

/// Snapshot of runtime counters
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStatus {
    pub name: String,
    pub backend: String,
    pub height: Version,
    pub records: usize,
    pub committed_transactions: u64,
    pub rejected_transactions: u64,
    pub open_cursors: usize,
}

fn unexpected(invocation: &str, output: InvocationOutput) -> RegistryError {
    RegistryError::Internal(format!("{} produced unexpected output {:?}", invocation, output))
}

/// Node runtime managing the world state and record store
pub struct NodeRuntime {
    config: NodeConfig,
    world: Arc<dyn WorldState>,
    store: RecordStore,
    next_tx: AtomicU64,
    committed: AtomicU64,
    rejected: AtomicU64,
}

impl NodeRuntime {
    /// Open the configured world state backend
    pub fn new(config: NodeConfig) -> RegistryResult<Self> {
        let world: Arc<dyn WorldState> = match config.storage.backend {
            StorageBackend::Memory => create_memory_state(),
            StorageBackend::Sled => create_sled_state(config.state_path())?,
        };
        Ok(Self::with_world(config, world))
    }

    /// Run on top of an existing world state
    pub fn with_world(config: NodeConfig, world: Arc<dyn WorldState>) -> Self {
        let store = RecordStore::new(config.registry.clone());
        Self {
            config,
            world,
            store,
            next_tx: AtomicU64::new(0),
            committed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Seed demonstration data when configured and the ledger is empty
    pub async fn initialize(&self) -> RegistryResult<()> {
        if self.config.registry.seed_on_start {
            if self.world.is_empty()? {
                let seeded = self.seed_ledger().await?;
                info!("Seeded {} records on start", seeded);
            } else {
                info!("Ledger already holds data, skipping seed");
            }
        }
        Ok(())
    }

    /// Execute one invocation in its own transaction.
    ///
    /// Writes are committed only if the operation succeeds; a stale read
    /// set at commit time fails the whole invocation with `MvccConflict`.
    pub async fn invoke(&self, invocation: Invocation) -> RegistryResult<InvocationOutput> {
        let tx_id = self.next_tx.fetch_add(1, Ordering::SeqCst) + 1;
        let span = info_span!("tx", id = tx_id, function = invocation.name());

        async move {
            let ctx = TxContext::new(tx_id, self.world.clone());
            let output = self.store.invoke(&ctx, invocation).await?;

            match ctx.commit() {
                Ok(Some(height)) => {
                    self.committed.fetch_add(1, Ordering::SeqCst);
                    info!("Committed at height {}", height);
                }
                Ok(None) => {}
                Err(e) => {
                    self.rejected.fetch_add(1, Ordering::SeqCst);
                    warn!("Commit rejected: {}", e);
                    return Err(e);
                }
            }
            Ok(output)
        }
        .instrument(span)
        .await
    }

    /// Parse a function name and arguments, then invoke
    pub async fn invoke_function(
        &self,
        function: &str,
        args: &[String],
    ) -> RegistryResult<InvocationOutput> {
        let invocation = Invocation::from_args(function, args)?;
        self.invoke(invocation).await
    }

    pub async fn seed_ledger(&self) -> RegistryResult<usize> {
        match self.invoke(Invocation::SeedLedger).await? {
            InvocationOutput::Seeded { seeded } => Ok(seeded),
            other => Err(unexpected("SeedLedger", other)),
        }
    }

    pub async fn create_record(&self, key: &str, record: PropertyRecord) -> RegistryResult<()> {
        let invocation = Invocation::CreateRecord {
            key: key.to_string(),
            record,
        };
        match self.invoke(invocation).await? {
            InvocationOutput::Created { .. } => Ok(()),
            other => Err(unexpected("CreateRecord", other)),
        }
    }

    pub async fn read_record(&self, key: &str) -> RegistryResult<PropertyRecord> {
        let invocation = Invocation::ReadRecord {
            key: key.to_string(),
        };
        match self.invoke(invocation).await? {
            InvocationOutput::Record(record) => Ok(record),
            other => Err(unexpected("ReadRecord", other)),
        }
    }

    pub async fn list_all_records(&self) -> RegistryResult<Vec<KeyedRecord>> {
        match self.invoke(Invocation::ListAllRecords).await? {
            InvocationOutput::Records(records) => Ok(records),
            other => Err(unexpected("ListAllRecords", other)),
        }
    }

    pub async fn transfer_owner(&self, key: &str, new_owner: &str) -> RegistryResult<KeyedRecord> {
        let invocation = Invocation::TransferOwner {
            key: key.to_string(),
            new_owner: new_owner.to_string(),
        };
        match self.invoke(invocation).await? {
            InvocationOutput::Transferred(keyed) => Ok(keyed),
            other => Err(unexpected("TransferOwner", other)),
        }
    }

    pub async fn query_by_owner(&self, owner: &str) -> RegistryResult<Vec<OwnerReport>> {
        let invocation = Invocation::QueryByOwner {
            owner: owner.to_string(),
        };
        match self.invoke(invocation).await? {
            InvocationOutput::Report(report) => Ok(report),
            other => Err(unexpected("QueryByOwner", other)),
        }
    }

    pub fn status(&self) -> RegistryResult<RuntimeStatus> {
        Ok(RuntimeStatus {
            name: self.config.name.clone(),
            backend: self.world.backend().to_string(),
            height: self.world.version(),
            records: self.world.len()?,
            committed_transactions: self.committed.load(Ordering::SeqCst),
            rejected_transactions: self.rejected.load(Ordering::SeqCst),
            open_cursors: self.world.cursors().open_cursors(),
        })
    }

    /// Get config reference
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Get world state reference
    pub fn world(&self) -> &Arc<dyn WorldState> {
        &self.world
    }
}
