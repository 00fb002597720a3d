//! Per-invocation transaction context
//!
//! A [`TxContext`] is the ledger handle the registry sees. Reads go to the
//! committed world state and are recorded in a read set; writes are
//! buffered and become visible to later reads in the same transaction.
//! Nothing reaches the world state until [`TxContext::commit`], which fails
//! with `MvccConflict` if any recorded read has since been overwritten.

use async_trait::async_trait;
use landreg_core::{
    ChaincodeStub, KvEntry, RegistryError, RegistryResult, Selector, StateIterator,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::iterator::SnapshotIterator;
use crate::query::MangoQuery;
use crate::store::{in_range, ReadWriteSet, Version, WorldState};

fn validate_key(key: &str) -> RegistryResult<()> {
    if key.is_empty() {
        return Err(RegistryError::InvalidArgument("key must not be an empty string".into()));
    }
    Ok(())
}

/// Transaction-scoped view of a world state
pub struct TxContext {
    tx_id: u64,
    world: Arc<dyn WorldState>,
    rwset: Mutex<ReadWriteSet>,
}

impl TxContext {
    pub fn new(tx_id: u64, world: Arc<dyn WorldState>) -> Self {
        Self {
            tx_id,
            world,
            rwset: Mutex::new(ReadWriteSet::default()),
        }
    }

    pub fn tx_id(&self) -> u64 {
        self.tx_id
    }

    /// Copy of what the transaction has read and written so far
    pub fn rwset(&self) -> ReadWriteSet {
        self.rwset.lock().clone()
    }

    /// Apply buffered writes. Read-only transactions commit nothing and
    /// return `None`.
    pub fn commit(self) -> RegistryResult<Option<Version>> {
        let rwset = self.rwset.into_inner();
        if rwset.is_read_only() {
            return Ok(None);
        }
        match self.world.commit(&rwset) {
            Ok(height) => {
                debug!("tx {} committed at height {}", self.tx_id, height);
                Ok(Some(height))
            }
            Err(e) => {
                warn!("tx {} rejected: {}", self.tx_id, e);
                Err(e)
            }
        }
    }

    fn record_read(&self, key: &str, version: Option<Version>) {
        self.rwset
            .lock()
            .reads
            .entry(key.to_string())
            .or_insert(version);
    }
}

#[async_trait]
impl ChaincodeStub for TxContext {
    async fn get_state(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        validate_key(key)?;
        if let Some(value) = self.rwset.lock().writes.get(key) {
            return Ok(Some(value.clone()));
        }

        let stored = self.world.get(key)?;
        self.record_read(key, stored.as_ref().map(|v| v.version));
        Ok(stored.map(|v| v.value))
    }

    async fn put_state(&self, key: &str, value: &[u8]) -> RegistryResult<()> {
        validate_key(key)?;
        self.rwset
            .lock()
            .writes
            .insert(key.to_string(), value.to_vec());
        debug!("tx {} put {} ({} bytes)", self.tx_id, key, value.len());
        Ok(())
    }

    async fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> RegistryResult<Box<dyn StateIterator>> {
        let committed = self.world.range(start_key, end_key)?;

        let mut merged: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        {
            let mut rwset = self.rwset.lock();
            for (key, stored) in committed {
                rwset.reads.entry(key.clone()).or_insert(Some(stored.version));
                merged.insert(key, stored.value);
            }
            for (key, value) in rwset.writes.iter() {
                if in_range(key, start_key, end_key) {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }

        let entries = merged
            .into_iter()
            .map(|(key, value)| KvEntry::new(key, value))
            .collect();
        Ok(Box::new(SnapshotIterator::new(entries, self.world.cursors())))
    }

    async fn get_query_result(&self, selector: &Selector) -> RegistryResult<Box<dyn StateIterator>> {
        let query = MangoQuery::from_selector(selector).to_query_string();
        debug!("tx {} rich query {}", self.tx_id, query);

        // Rich queries see committed state only and are not re-validated
        let entries = self
            .world
            .query(&query)?
            .into_iter()
            .map(|(key, stored)| KvEntry::new(key, stored.value))
            .collect();
        Ok(Box::new(SnapshotIterator::new(entries, self.world.cursors())))
    }
}
