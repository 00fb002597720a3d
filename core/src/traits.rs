//! Core traits defining LANDREG interfaces
//!
//! The registry never talks to a concrete store. Every operation receives a
//! request-scoped [`ChaincodeStub`] and goes through it for reads, writes,
//! range scans and rich queries.

use async_trait::async_trait;
use tracing::warn;

use crate::types::{KvEntry, Selector};

/// Result type for LANDREG operations
pub type RegistryResult<T> = Result<T, crate::error::RegistryError>;

/// Cursor over ledger entries opened by a range scan or rich query.
///
/// Cursors hold backend resources and must be closed exactly once. Use
/// [`Cursor`] to get that for free on every exit path.
#[async_trait]
pub trait StateIterator: Send {
    /// Whether another entry is available
    fn has_next(&self) -> bool;

    /// Fetch the next entry, `None` once exhausted
    async fn next_entry(&mut self) -> RegistryResult<Option<KvEntry>>;

    /// Release the cursor
    fn close(&mut self) -> RegistryResult<()>;
}

/// Per-transaction ledger handle
#[async_trait]
pub trait ChaincodeStub: Send + Sync {
    /// Read a value. `Ok(None)` means the key holds nothing.
    async fn get_state(&self, key: &str) -> RegistryResult<Option<Vec<u8>>>;

    /// Write a value, replacing whatever the key held
    async fn put_state(&self, key: &str, value: &[u8]) -> RegistryResult<()>;

    /// Scan `[start_key, end_key)` in key order. Empty bounds are open.
    async fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> RegistryResult<Box<dyn StateIterator>>;

    /// Run a predicate query over stored documents. Result order is
    /// backend-defined.
    async fn get_query_result(&self, selector: &Selector) -> RegistryResult<Box<dyn StateIterator>>;
}

/// Owning wrapper that closes its iterator when dropped.
///
/// Call [`Cursor::close`] on the success path to observe close errors;
/// early returns and `?` fall back to the drop, which logs them instead.
pub struct Cursor {
    inner: Option<Box<dyn StateIterator>>,
}

impl Cursor {
    pub fn new(inner: Box<dyn StateIterator>) -> Self {
        Self { inner: Some(inner) }
    }

    pub fn has_next(&self) -> bool {
        self.inner.as_ref().map(|it| it.has_next()).unwrap_or(false)
    }

    pub async fn next_entry(&mut self) -> RegistryResult<Option<KvEntry>> {
        match self.inner.as_mut() {
            Some(it) => it.next_entry().await,
            None => Ok(None),
        }
    }

    pub fn close(mut self) -> RegistryResult<()> {
        match self.inner.take() {
            Some(mut it) => it.close(),
            None => Ok(()),
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        if let Some(mut it) = self.inner.take() {
            if let Err(e) = it.close() {
                warn!("Failed to close ledger cursor: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingIterator {
        entries: Vec<KvEntry>,
        closes: Arc<AtomicUsize>,
        fail_at: Option<usize>,
        pos: usize,
    }

    #[async_trait]
    impl StateIterator for CountingIterator {
        fn has_next(&self) -> bool {
            self.pos < self.entries.len()
        }

        async fn next_entry(&mut self) -> RegistryResult<Option<KvEntry>> {
            if self.fail_at == Some(self.pos) {
                return Err(RegistryError::Persistence("fetch failed".into()));
            }
            let entry = self.entries.get(self.pos).cloned();
            self.pos += 1;
            Ok(entry)
        }

        fn close(&mut self) -> RegistryResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn cursor(fail_at: Option<usize>, closes: &Arc<AtomicUsize>) -> Cursor {
        Cursor::new(Box::new(CountingIterator {
            entries: vec![KvEntry::new("a", b"1".to_vec()), KvEntry::new("b", b"2".to_vec())],
            closes: closes.clone(),
            fail_at,
            pos: 0,
        }))
    }

    async fn drain(mut cursor: Cursor) -> RegistryResult<usize> {
        let mut seen = 0;
        while let Some(_) = cursor.next_entry().await? {
            seen += 1;
        }
        cursor.close()?;
        Ok(seen)
    }

    #[tokio::test]
    async fn test_cursor_closes_once_on_success() {
        let closes = Arc::new(AtomicUsize::new(0));
        assert_eq!(drain(cursor(None, &closes)).await.unwrap(), 2);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cursor_closes_on_error_path() {
        let closes = Arc::new(AtomicUsize::new(0));
        assert!(drain(cursor(Some(1), &closes)).await.is_err());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
