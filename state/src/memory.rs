//! In-memory world state for testing and ephemeral nodes

use landreg_core::{RegistryError, RegistryResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::iterator::CursorTracker;
use crate::store::{key_bounds, ReadWriteSet, Version, VersionedValue, WorldState};

/// In-memory world state
pub struct MemoryWorldState {
    data: RwLock<BTreeMap<String, VersionedValue>>,
    version: RwLock<Version>,
    cursors: CursorTracker,
}

impl MemoryWorldState {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            version: RwLock::new(0),
            cursors: CursorTracker::new(),
        }
    }

    /// Pre-populate committed state at height 0, bypassing transactions
    pub fn with_data(data: Vec<(String, Vec<u8>)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.data.write();
            for (key, value) in data {
                map.insert(key, VersionedValue::new(value, 0));
            }
        }
        store
    }
}

impl Default for MemoryWorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState for MemoryWorldState {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn version(&self) -> Version {
        *self.version.read()
    }

    fn get(&self, key: &str) -> RegistryResult<Option<VersionedValue>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn range(&self, start: &str, end: &str) -> RegistryResult<Vec<(String, VersionedValue)>> {
        let Some(bounds) = key_bounds(start, end) else {
            return Ok(Vec::new());
        };
        let data = self.data.read();
        Ok(data
            .range::<str, _>(bounds)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(&self, rwset: &ReadWriteSet) -> RegistryResult<Version> {
        // Hold both locks for the whole validate-and-apply step
        let mut data = self.data.write();
        let mut version = self.version.write();

        for (key, seen) in &rwset.reads {
            let current = data.get(key).map(|v| v.version);
            if current != *seen {
                return Err(RegistryError::MvccConflict { key: key.clone() });
            }
        }

        let new_version = *version + 1;
        for (key, value) in &rwset.writes {
            data.insert(key.clone(), VersionedValue::new(value.clone(), new_version));
        }
        *version = new_version;

        debug!(
            "Committed height {} ({} reads, {} writes)",
            new_version,
            rwset.reads.len(),
            rwset.writes.len()
        );
        Ok(new_version)
    }

    fn len(&self) -> RegistryResult<usize> {
        Ok(self.data.read().len())
    }

    fn cursors(&self) -> &CursorTracker {
        &self.cursors
    }
}

/// Thread-safe memory state wrapper
pub type SharedMemoryWorldState = Arc<MemoryWorldState>;

/// Create a shared memory world state
pub fn create_memory_state() -> SharedMemoryWorldState {
    Arc::new(MemoryWorldState::new())
}
