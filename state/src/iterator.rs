//! Ledger cursors

use async_trait::async_trait;
use landreg_core::{KvEntry, RegistryError, RegistryResult, StateIterator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts cursors that are open against a world state
#[derive(Debug, Clone, Default)]
pub struct CursorTracker {
    open: Arc<AtomicUsize>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cursor; it stays counted until the handle is dropped
    pub fn open(&self) -> CursorHandle {
        self.open.fetch_add(1, Ordering::SeqCst);
        CursorHandle {
            open: self.open.clone(),
        }
    }

    pub fn open_cursors(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

/// Registration of one open cursor
#[derive(Debug)]
pub struct CursorHandle {
    open: Arc<AtomicUsize>,
}

impl Drop for CursorHandle {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Cursor over a materialized result set
pub struct SnapshotIterator {
    entries: VecDeque<KvEntry>,
    handle: Option<CursorHandle>,
}

impl SnapshotIterator {
    pub fn new(entries: Vec<KvEntry>, tracker: &CursorTracker) -> Self {
        Self {
            entries: entries.into(),
            handle: Some(tracker.open()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }
}

#[async_trait]
impl StateIterator for SnapshotIterator {
    fn has_next(&self) -> bool {
        !self.is_closed() && !self.entries.is_empty()
    }

    async fn next_entry(&mut self) -> RegistryResult<Option<KvEntry>> {
        if self.is_closed() {
            return Err(RegistryError::Persistence("cursor already closed".into()));
        }
        Ok(self.entries.pop_front())
    }

    fn close(&mut self) -> RegistryResult<()> {
        self.entries.clear();
        self.handle.take();
        Ok(())
    }
}
