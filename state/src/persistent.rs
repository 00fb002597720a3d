//! Persistent world state using sled database

use landreg_core::{RegistryError, RegistryResult};
use parking_lot::RwLock;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::{Db, Transactional, Tree};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::iterator::CursorTracker;
use crate::store::{key_bounds, ReadWriteSet, Version, VersionedValue, WorldState};

const STATE_TREE: &str = "state";
const META_TREE: &str = "meta";
const VERSION_KEY: &[u8] = b"version";

fn storage_err(e: impl std::fmt::Display) -> RegistryError {
    RegistryError::persistence("sled", e)
}

fn byte_bound(bound: Bound<&str>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_bytes()),
        Bound::Excluded(k) => Bound::Excluded(k.as_bytes()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

fn decode_height(bytes: &[u8]) -> RegistryResult<Version> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| {
        RegistryError::Decode(format!("stored height is {} bytes, expected 8", bytes.len()))
    })?;
    Ok(u64::from_le_bytes(raw))
}

fn decode_versioned(bytes: &[u8]) -> RegistryResult<VersionedValue> {
    bincode::deserialize(bytes).map_err(|e| RegistryError::Decode(e.to_string()))
}

fn encode_versioned(value: &VersionedValue) -> RegistryResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| RegistryError::Internal(e.to_string()))
}

/// Persistent world state backed by sled database
pub struct SledWorldState {
    db: Db,
    state: Tree,
    meta: Tree,
    version: RwLock<Version>,
    cursors: CursorTracker,
}

impl SledWorldState {
    pub fn open<P: AsRef<Path>>(path: P) -> RegistryResult<Self> {
        let db = sled::open(path.as_ref()).map_err(storage_err)?;
        let state = db.open_tree(STATE_TREE).map_err(storage_err)?;
        let meta = db.open_tree(META_TREE).map_err(storage_err)?;

        // Load version from disk or start at 0
        let version = match meta.get(VERSION_KEY).map_err(storage_err)? {
            Some(bytes) => decode_height(&bytes)?,
            None => 0,
        };

        info!(
            "Opened sled world state at {} (height {})",
            path.as_ref().display(),
            version
        );

        Ok(Self {
            db,
            state,
            meta,
            version: RwLock::new(version),
            cursors: CursorTracker::new(),
        })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> RegistryResult<()> {
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }
}

impl WorldState for SledWorldState {
    fn backend(&self) -> &'static str {
        "sled"
    }

    fn version(&self) -> Version {
        *self.version.read()
    }

    fn get(&self, key: &str) -> RegistryResult<Option<VersionedValue>> {
        match self.state.get(key.as_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(decode_versioned(&bytes)?)),
            None => Ok(None),
        }
    }

    fn range(&self, start: &str, end: &str) -> RegistryResult<Vec<(String, VersionedValue)>> {
        let Some((lower, upper)) = key_bounds(start, end) else {
            return Ok(Vec::new());
        };
        let mut entries = Vec::new();
        for result in self.state.range::<&[u8], _>((byte_bound(lower), byte_bound(upper))) {
            let (key, value) = result.map_err(storage_err)?;
            let key = String::from_utf8(key.to_vec())
                .map_err(|e| RegistryError::Decode(format!("non-UTF-8 key: {}", e)))?;
            entries.push((key, decode_versioned(&value)?));
        }
        Ok(entries)
    }

    fn commit(&self, rwset: &ReadWriteSet) -> RegistryResult<Version> {
        let result = (&self.state, &self.meta).transaction(|(state, meta)| {
            for (key, seen) in &rwset.reads {
                let current = match state.get(key.as_bytes())? {
                    Some(bytes) => Some(
                        decode_versioned(&bytes)
                            .map_err(ConflictableTransactionError::Abort)?
                            .version,
                    ),
                    None => None,
                };
                if current != *seen {
                    return Err(ConflictableTransactionError::Abort(RegistryError::MvccConflict {
                        key: key.clone(),
                    }));
                }
            }

            let old_version = match meta.get(VERSION_KEY)? {
                Some(bytes) => {
                    decode_height(&bytes).map_err(ConflictableTransactionError::Abort)?
                }
                None => 0,
            };
            let new_version = old_version + 1;

            for (key, value) in &rwset.writes {
                let stored = encode_versioned(&VersionedValue::new(value.clone(), new_version))
                    .map_err(ConflictableTransactionError::Abort)?;
                state.insert(key.as_bytes(), stored)?;
            }
            meta.insert(VERSION_KEY, new_version.to_le_bytes().to_vec())?;

            Ok(new_version)
        });

        let new_version = result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => storage_err(e),
        })?;

        // Flush to disk
        self.flush()?;
        {
            let mut version = self.version.write();
            *version = (*version).max(new_version);
        }

        debug!(
            "Committed height {} ({} reads, {} writes)",
            new_version,
            rwset.reads.len(),
            rwset.writes.len()
        );
        Ok(new_version)
    }

    fn len(&self) -> RegistryResult<usize> {
        Ok(self.state.len())
    }

    fn cursors(&self) -> &CursorTracker {
        &self.cursors
    }
}

/// Thread-safe persistent state wrapper
pub type SharedSledWorldState = Arc<SledWorldState>;

/// Create a shared persistent world state
pub fn create_sled_state<P: AsRef<Path>>(path: P) -> RegistryResult<SharedSledWorldState> {
    Ok(Arc::new(SledWorldState::open(path)?))
}
