//! Core world state traits and types

use landreg_core::RegistryResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;

use crate::iterator::CursorTracker;
use crate::query::MangoQuery;

/// Commit height. Every committed write is stamped with the height of the
/// commit that produced it.
pub type Version = u64;

/// Stored value plus the height it was written at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: Version,
}

impl VersionedValue {
    pub fn new(value: Vec<u8>, version: Version) -> Self {
        Self { value, version }
    }
}

/// What a transaction observed and what it wants to write.
///
/// `reads` maps each key to the version seen on first read, `None` when the
/// key was absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadWriteSet {
    pub reads: BTreeMap<String, Option<Version>>,
    pub writes: BTreeMap<String, Vec<u8>>,
}

impl ReadWriteSet {
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Committed, shared key-value state.
///
/// Backends keep keys in lexicographic order and apply a [`ReadWriteSet`]
/// atomically, after checking that none of its reads went stale.
pub trait WorldState: Send + Sync {
    /// Short backend name for status output
    fn backend(&self) -> &'static str;

    /// Height of the latest commit
    fn version(&self) -> Version;

    fn get(&self, key: &str) -> RegistryResult<Option<VersionedValue>>;

    /// Entries in `[start, end)`, ascending. Empty bounds are open.
    fn range(&self, start: &str, end: &str) -> RegistryResult<Vec<(String, VersionedValue)>>;

    /// Validate the read set and apply the writes as one unit
    fn commit(&self, rwset: &ReadWriteSet) -> RegistryResult<Version>;

    fn len(&self) -> RegistryResult<usize>;

    fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Open-cursor accounting for this state
    fn cursors(&self) -> &CursorTracker;

    /// Evaluate a Mango query string against every stored JSON document.
    /// Values that are not JSON objects are never matched.
    fn query(&self, query: &str) -> RegistryResult<Vec<(String, VersionedValue)>> {
        let query = MangoQuery::parse(query)?;
        let matches = self
            .range("", "")?
            .into_iter()
            .filter(|(_, v)| {
                serde_json::from_slice::<serde_json::Value>(&v.value)
                    .map(|doc| query.matches(&doc))
                    .unwrap_or(false)
            })
            .collect();
        Ok(matches)
    }
}

/// Bounds for a `[start, end)` scan. Empty strings leave that side open.
/// Returns `None` when the range cannot contain any key.
pub fn key_bounds<'a>(start: &'a str, end: &'a str) -> Option<(Bound<&'a str>, Bound<&'a str>)> {
    if !start.is_empty() && !end.is_empty() && start >= end {
        return None;
    }
    let lower = if start.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Included(start)
    };
    let upper = if end.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(end)
    };
    Some((lower, upper))
}

/// Whether `key` falls inside `[start, end)` with open empty bounds
pub fn in_range(key: &str, start: &str, end: &str) -> bool {
    (start.is_empty() || key >= start) && (end.is_empty() || key < end)
}
