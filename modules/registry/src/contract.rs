//! Record store - property record management over a ledger transaction

use landreg_core::{
    ChaincodeStub, CreatePolicy, Cursor, DecodePolicy, KeyedRecord, OwnerReport, PropertyRecord,
    RegistryConfig, RegistryError, RegistryResult, Selector,
};
use tracing::{debug, info, warn};

use crate::seed::keyed_seed_records;

/// Property record store.
///
/// Stateless apart from its configuration: every operation works through
/// the transaction handle it is given, so one store can serve any number of
/// concurrent invocations.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    config: RegistryConfig,
}

impl RecordStore {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Write the six demonstration records under `PROP0`..`PROP5`.
    ///
    /// Existing values under those keys are replaced. Stops at the first
    /// failing write; earlier writes stay in the transaction.
    pub async fn seed_ledger(&self, ctx: &dyn ChaincodeStub) -> RegistryResult<usize> {
        let records = keyed_seed_records();
        for (key, record) in &records {
            ctx.put_state(key, &record.to_bytes()?).await?;
            debug!("Seeded {}: {}", key, record);
        }

        info!("Seeded ledger with {} records", records.len());
        Ok(records.len())
    }

    /// Store `record` under `key`, subject to the configured [`CreatePolicy`]
    pub async fn create_record(
        &self,
        ctx: &dyn ChaincodeStub,
        key: &str,
        record: &PropertyRecord,
    ) -> RegistryResult<()> {
        if self.config.create_policy == CreatePolicy::RejectExisting
            && ctx.get_state(key).await?.is_some()
        {
            return Err(RegistryError::AlreadyExists(key.to_string()));
        }

        ctx.put_state(key, &record.to_bytes()?).await?;
        debug!("Created {}: {}", key, record);
        Ok(())
    }

    /// Fetch the record stored under `key`
    pub async fn read_record(
        &self,
        ctx: &dyn ChaincodeStub,
        key: &str,
    ) -> RegistryResult<PropertyRecord> {
        let bytes = ctx
            .get_state(key)
            .await?
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;

        self.decode(key, &bytes)
    }

    /// Every record in ascending key order
    pub async fn list_all_records(&self, ctx: &dyn ChaincodeStub) -> RegistryResult<Vec<KeyedRecord>> {
        let mut cursor = Cursor::new(ctx.get_state_by_range("", "").await?);

        let mut results = Vec::new();
        while cursor.has_next() {
            let Some(entry) = cursor.next_entry().await? else {
                break;
            };
            let record = self.decode(&entry.key, &entry.value)?;
            results.push(KeyedRecord {
                key: entry.key,
                record,
            });
        }
        cursor.close()?;

        Ok(results)
    }

    /// Replace the owner of the record under `key` and return the updated record
    pub async fn transfer_owner(
        &self,
        ctx: &dyn ChaincodeStub,
        key: &str,
        new_owner: &str,
    ) -> RegistryResult<PropertyRecord> {
        let current = self.read_record(ctx, key).await?;
        let previous_owner = current.owner.clone();
        let updated = current.with_owner(new_owner);

        ctx.put_state(key, &updated.to_bytes()?).await?;
        info!("Transferred {} from {} to {}", key, previous_owner, new_owner);
        Ok(updated)
    }

    /// Property types of every record owned exactly by `owner`.
    /// Result order is whatever the ledger's query engine returns.
    pub async fn query_by_owner(
        &self,
        ctx: &dyn ChaincodeStub,
        owner: &str,
    ) -> RegistryResult<Vec<OwnerReport>> {
        let selector = Selector::owner(owner);
        let mut cursor = Cursor::new(ctx.get_query_result(&selector).await?);

        let mut report = Vec::new();
        while cursor.has_next() {
            let Some(entry) = cursor.next_entry().await? else {
                break;
            };
            let row = OwnerReport::from_bytes(&entry.value).map_err(|e| {
                RegistryError::Decode(format!("{}: {}", entry.key, e))
            })?;
            report.push(row);
        }
        cursor.close()?;

        debug!("Owner query {} matched {} records", selector, report.len());
        Ok(report)
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> RegistryResult<PropertyRecord> {
        match PropertyRecord::from_bytes(bytes) {
            Ok(record) => Ok(record),
            Err(e) => match self.config.decode_policy {
                DecodePolicy::Strict => Err(RegistryError::Decode(format!("{}: {}", key, e))),
                DecodePolicy::Lenient => {
                    warn!("Malformed record under {}, returning empty record: {}", key, e);
                    Ok(PropertyRecord::default())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use landreg_core::{KvEntry, StateIterator};
    use landreg_state::{MemoryWorldState, TxContext, WorldState};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn flat(owner: &str) -> PropertyRecord {
        PropertyRecord::new("Flat", "Chennai", "TN", "1200", owner)
    }

    fn setup() -> (Arc<MemoryWorldState>, RecordStore) {
        (Arc::new(MemoryWorldState::new()), RecordStore::default())
    }

    fn tx(world: &Arc<MemoryWorldState>) -> TxContext {
        TxContext::new(0, world.clone())
    }

    async fn seeded() -> (Arc<MemoryWorldState>, RecordStore) {
        let (world, store) = setup();
        let ctx = tx(&world);
        store.seed_ledger(&ctx).await.unwrap();
        ctx.commit().unwrap();
        (world, store)
    }

    /// Ledger handle that fails chosen calls and counts cursor closes
    #[derive(Default)]
    struct Faults {
        fail_put_at: Option<usize>,
        fail_get: bool,
        fail_scan: bool,
        fail_fetch_at: Option<usize>,
    }

    struct FaultyStub {
        inner: TxContext,
        faults: Faults,
        puts: AtomicUsize,
        closes: Arc<AtomicUsize>,
    }

    impl FaultyStub {
        fn new(inner: TxContext, faults: Faults) -> Self {
            Self {
                inner,
                faults,
                puts: AtomicUsize::new(0),
                closes: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn wrap(&self, inner: Box<dyn StateIterator>) -> Box<dyn StateIterator> {
            Box::new(FaultyIterator {
                inner,
                fail_at: self.faults.fail_fetch_at,
                fetched: 0,
                closes: self.closes.clone(),
            })
        }
    }

    struct FaultyIterator {
        inner: Box<dyn StateIterator>,
        fail_at: Option<usize>,
        fetched: usize,
        closes: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl StateIterator for FaultyIterator {
        fn has_next(&self) -> bool {
            self.inner.has_next()
        }

        async fn next_entry(&mut self) -> RegistryResult<Option<KvEntry>> {
            if self.fail_at == Some(self.fetched) {
                return Err(RegistryError::Persistence("cursor fetch failed".into()));
            }
            self.fetched += 1;
            self.inner.next_entry().await
        }

        fn close(&mut self) -> RegistryResult<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.inner.close()
        }
    }

    #[async_trait]
    impl ChaincodeStub for FaultyStub {
        async fn get_state(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
            if self.faults.fail_get {
                return Err(RegistryError::Persistence("read failed".into()));
            }
            self.inner.get_state(key).await
        }

        async fn put_state(&self, key: &str, value: &[u8]) -> RegistryResult<()> {
            let n = self.puts.fetch_add(1, Ordering::SeqCst);
            if self.faults.fail_put_at == Some(n) {
                return Err(RegistryError::Persistence("write failed".into()));
            }
            self.inner.put_state(key, value).await
        }

        async fn get_state_by_range(
            &self,
            start_key: &str,
            end_key: &str,
        ) -> RegistryResult<Box<dyn StateIterator>> {
            if self.faults.fail_scan {
                return Err(RegistryError::Persistence("scan failed".into()));
            }
            Ok(self.wrap(self.inner.get_state_by_range(start_key, end_key).await?))
        }

        async fn get_query_result(
            &self,
            selector: &Selector,
        ) -> RegistryResult<Box<dyn StateIterator>> {
            if self.faults.fail_scan {
                return Err(RegistryError::Persistence("query engine unavailable".into()));
            }
            Ok(self.wrap(self.inner.get_query_result(selector).await?))
        }
    }

    #[tokio::test]
    async fn test_create_then_read_roundtrip() {
        let (world, store) = setup();
        let ctx = tx(&world);
        let record = PropertyRecord::new("Res Plot", "Coimbatore", "TN", "4000", "Jagan");

        store.create_record(&ctx, "LOT-7", &record).await.unwrap();
        assert_eq!(store.read_record(&ctx, "LOT-7").await.unwrap(), record);

        ctx.commit().unwrap();
        let ctx = tx(&world);
        assert_eq!(store.read_record(&ctx, "LOT-7").await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_create_overwrites_by_default() {
        let (world, store) = setup();
        let ctx = tx(&world);

        store.create_record(&ctx, "PROP0", &flat("Dev")).await.unwrap();
        let second = PropertyRecord::new("Farm Land", "Palakkad", "KL", "9000", "Maya");
        store.create_record(&ctx, "PROP0", &second).await.unwrap();

        assert_eq!(store.read_record(&ctx, "PROP0").await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_create_reject_existing_policy() {
        let (world, _) = seeded().await;
        let store = RecordStore::new(RegistryConfig {
            create_policy: CreatePolicy::RejectExisting,
            ..Default::default()
        });
        let ctx = tx(&world);

        let err = store.create_record(&ctx, "PROP0", &flat("Maya")).await.unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists(ref k) if k == "PROP0"));
        assert_eq!(store.read_record(&ctx, "PROP0").await.unwrap().owner, "Dev");

        store.create_record(&ctx, "PROP6", &flat("Maya")).await.unwrap();
        assert_eq!(store.read_record(&ctx, "PROP6").await.unwrap().owner, "Maya");
    }

    #[tokio::test]
    async fn test_read_missing_key_is_not_found() {
        let (world, store) = setup();
        let err = store.read_record(&tx(&world), "PROP42").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "PROP42 does not exist");
    }

    #[tokio::test]
    async fn test_read_failure_is_persistence_error() {
        let (world, store) = seeded().await;
        let ctx = FaultyStub::new(
            tx(&world),
            Faults {
                fail_get: true,
                ..Default::default()
            },
        );
        let err = store.read_record(&ctx, "PROP0").await.unwrap_err();
        assert!(matches!(err, RegistryError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_read_malformed_value_strict_and_lenient() {
        let world = Arc::new(MemoryWorldState::with_data(vec![(
            "BROKEN".into(),
            b"{\"proptype\":".to_vec(),
        )]));

        let strict = RecordStore::default();
        let err = strict.read_record(&tx(&world), "BROKEN").await.unwrap_err();
        assert!(matches!(err, RegistryError::Decode(_)));

        let lenient = RecordStore::new(RegistryConfig {
            decode_policy: DecodePolicy::Lenient,
            ..Default::default()
        });
        let record = lenient.read_record(&tx(&world), "BROKEN").await.unwrap();
        assert_eq!(record, PropertyRecord::default());
    }

    #[tokio::test]
    async fn test_list_all_after_seed() {
        let (world, store) = seeded().await;
        let listed = store.list_all_records(&tx(&world)).await.unwrap();

        let expected: Vec<KeyedRecord> = keyed_seed_records()
            .into_iter()
            .map(|(key, record)| KeyedRecord { key, record })
            .collect();
        assert_eq!(listed, expected);
        assert_eq!(world.cursors().open_cursors(), 0);
    }

    #[tokio::test]
    async fn test_list_all_on_empty_ledger() {
        let (world, store) = setup();
        assert!(store.list_all_records(&tx(&world)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_closes_cursor_on_every_path() {
        let (world, store) = seeded().await;

        let ok = FaultyStub::new(tx(&world), Faults::default());
        store.list_all_records(&ok).await.unwrap();
        assert_eq!(ok.closes.load(Ordering::SeqCst), 1);

        let failing = FaultyStub::new(
            tx(&world),
            Faults {
                fail_fetch_at: Some(3),
                ..Default::default()
            },
        );
        let err = store.list_all_records(&failing).await.unwrap_err();
        assert!(matches!(err, RegistryError::Persistence(_)));
        assert_eq!(failing.closes.load(Ordering::SeqCst), 1);
        assert_eq!(world.cursors().open_cursors(), 0);

        let no_scan = FaultyStub::new(
            tx(&world),
            Faults {
                fail_scan: true,
                ..Default::default()
            },
        );
        assert!(matches!(
            store.list_all_records(&no_scan).await,
            Err(RegistryError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_list_all_strict_decode_closes_cursor() {
        let world = Arc::new(MemoryWorldState::with_data(vec![
            ("A".into(), flat("Dev").to_bytes().unwrap()),
            ("B".into(), b"garbage".to_vec()),
        ]));
        let store = RecordStore::default();

        let ctx = FaultyStub::new(tx(&world), Faults::default());
        assert!(matches!(
            store.list_all_records(&ctx).await,
            Err(RegistryError::Decode(_))
        ));
        assert_eq!(ctx.closes.load(Ordering::SeqCst), 1);

        let lenient = RecordStore::new(RegistryConfig {
            decode_policy: DecodePolicy::Lenient,
            ..Default::default()
        });
        let listed = lenient.list_all_records(&tx(&world)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].record, PropertyRecord::default());
    }

    #[tokio::test]
    async fn test_transfer_changes_only_owner() {
        let (world, store) = seeded().await;
        let ctx = tx(&world);
        let before = store.read_record(&ctx, "PROP3").await.unwrap();

        let returned = store.transfer_owner(&ctx, "PROP3", "Maya").await.unwrap();
        ctx.commit().unwrap();

        let after = store.read_record(&tx(&world), "PROP3").await.unwrap();
        assert_eq!(after, returned);
        assert_eq!(after.owner, "Maya");
        assert_eq!(after.prop_type, before.prop_type);
        assert_eq!(after.city, before.city);
        assert_eq!(after.state, before.state);
        assert_eq!(after.area, before.area);
    }

    #[tokio::test]
    async fn test_transfer_missing_key_writes_nothing() {
        let (world, store) = setup();
        let ctx = tx(&world);

        let err = store.transfer_owner(&ctx, "PROP0", "Maya").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(ctx.rwset().writes.is_empty());
    }

    #[tokio::test]
    async fn test_transfer_short_circuits_on_read_failure() {
        let (world, store) = seeded().await;
        let ctx = FaultyStub::new(
            tx(&world),
            Faults {
                fail_get: true,
                ..Default::default()
            },
        );

        assert!(store.transfer_owner(&ctx, "PROP0", "Maya").await.is_err());
        assert_eq!(ctx.puts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_query_by_owner_returns_type_projection() {
        let (world, store) = setup();
        let ctx = tx(&world);
        store
            .create_record(&ctx, "A1", &PropertyRecord::new("Flat", "Chennai", "TN", "1200", "Dev"))
            .await
            .unwrap();
        store
            .create_record(&ctx, "A2", &PropertyRecord::new("Ind House", "Bengaluru", "KA", "3200", "Abraham"))
            .await
            .unwrap();
        store
            .create_record(&ctx, "A3", &PropertyRecord::new("Farm Land", "Coimbatore", "TN", "100000", "Dev"))
            .await
            .unwrap();
        ctx.commit().unwrap();

        let mut types: Vec<String> = store
            .query_by_owner(&tx(&world), "Dev")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.prop_type)
            .collect();
        types.sort();
        assert_eq!(types, vec!["Farm Land", "Flat"]);

        assert!(store.query_by_owner(&tx(&world), "dev").await.unwrap().is_empty());
        assert!(store.query_by_owner(&tx(&world), "De").await.unwrap().is_empty());
        assert_eq!(world.cursors().open_cursors(), 0);
    }

    #[tokio::test]
    async fn test_query_by_owner_surfaces_decode_errors() {
        let world = Arc::new(MemoryWorldState::with_data(vec![(
            "ODD".into(),
            br#"{"propowner":"Dev","proptype":7}"#.to_vec(),
        )]));
        let store = RecordStore::new(RegistryConfig {
            decode_policy: DecodePolicy::Lenient,
            ..Default::default()
        });

        let ctx = FaultyStub::new(tx(&world), Faults::default());
        assert!(matches!(
            store.query_by_owner(&ctx, "Dev").await,
            Err(RegistryError::Decode(_))
        ));
        assert_eq!(ctx.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_query_by_owner_query_failure() {
        let (world, store) = seeded().await;
        let ctx = FaultyStub::new(
            tx(&world),
            Faults {
                fail_scan: true,
                ..Default::default()
            },
        );
        assert!(matches!(
            store.query_by_owner(&ctx, "Dev").await,
            Err(RegistryError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_aborts_on_first_failed_write() {
        let (world, store) = setup();
        let ctx = FaultyStub::new(
            tx(&world),
            Faults {
                fail_put_at: Some(2),
                ..Default::default()
            },
        );

        let err = store.seed_ledger(&ctx).await.unwrap_err();
        assert!(matches!(err, RegistryError::Persistence(_)));
        assert_eq!(ctx.puts.load(Ordering::SeqCst), 3);

        let written: Vec<String> = ctx.inner.rwset().writes.into_keys().collect();
        assert_eq!(written, vec!["PROP0", "PROP1"]);
    }

    #[tokio::test]
    async fn test_seed_overwrites_existing_keys() {
        let (world, store) = setup();
        let ctx = tx(&world);
        store.create_record(&ctx, "PROP0", &flat("Somebody")).await.unwrap();
        store.seed_ledger(&ctx).await.unwrap();
        assert_eq!(store.read_record(&ctx, "PROP0").await.unwrap().owner, "Dev");
    }

    #[tokio::test]
    async fn test_seed_read_transfer_scenario() {
        let (world, store) = seeded().await;

        let record = store.read_record(&tx(&world), "PROP0").await.unwrap();
        assert_eq!(record, PropertyRecord::new("Flat", "Chennai", "TN", "1200", "Dev"));

        let ctx = tx(&world);
        store.transfer_owner(&ctx, "PROP0", "Maya").await.unwrap();
        ctx.commit().unwrap();

        let record = store.read_record(&tx(&world), "PROP0").await.unwrap();
        assert_eq!(record, PropertyRecord::new("Flat", "Chennai", "TN", "1200", "Maya"));
    }

    #[tokio::test]
    async fn test_concurrent_transfers_lose_no_update() {
        let (world, store) = seeded().await;
        let first = tx(&world);
        let second = tx(&world);

        store.transfer_owner(&first, "PROP1", "Maya").await.unwrap();
        store.transfer_owner(&second, "PROP1", "Ravi").await.unwrap();

        first.commit().unwrap();
        assert!(matches!(
            second.commit(),
            Err(RegistryError::MvccConflict { .. })
        ));
        assert_eq!(store.read_record(&tx(&world), "PROP1").await.unwrap().owner, "Maya");
    }
}
