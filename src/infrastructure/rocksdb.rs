use crate::domain::ports::SubscriptionStore;
use crate::domain::subscription::{
    ClaimDecision, CycleOutcome, DiscardReason, Subscription, SubscriptionId,
};
use crate::error::{Result, ZapError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for subscription rows, stored as JSON keyed by id.
pub const CF_SUBSCRIPTIONS: &str = "subscriptions";

/// A persistent subscription store on RocksDB.
///
/// RocksDB gives durability but no read-modify-write primitive, so all
/// mutating operations serialize on one async mutex; with a single store
/// instance per database that is the required per-row atomicity.
///
/// `Clone` shares the underlying handle.
#[derive(Clone)]
pub struct RocksDbSubscriptionStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDbSubscriptionStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_subscriptions = ColumnFamilyDescriptor::new(CF_SUBSCRIPTIONS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_subscriptions])
            .map_err(|e| ZapError::Storage(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(CF_SUBSCRIPTIONS)
            .ok_or_else(|| ZapError::Storage("subscriptions column family not found".to_string()))
    }

    fn read_row(&self, id: &SubscriptionId) -> Result<Option<Subscription>> {
        let cf = self.cf()?;
        let bytes = self
            .db
            .get_cf(cf, id.to_string())
            .map_err(|e| ZapError::Storage(e.to_string()))?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_row(&self, subscription: &Subscription) -> Result<()> {
        let cf = self.cf()?;
        let value = serde_json::to_vec(subscription)?;
        self.db
            .put_cf(cf, subscription.id.to_string(), value)
            .map_err(|e| ZapError::Storage(e.to_string()))
    }
}

#[async_trait]
impl SubscriptionStore for RocksDbSubscriptionStore {
    async fn insert(&self, subscription: Subscription) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.put_row(&subscription)
    }

    async fn get(&self, id: &SubscriptionId) -> Result<Option<Subscription>> {
        self.read_row(id)
    }

    async fn claim_cycle(
        &self,
        id: &SubscriptionId,
        now: DateTime<Utc>,
        max_retries: u32,
    ) -> Result<ClaimDecision> {
        let _guard = self.write_lock.lock().await;
        let Some(mut row) = self.read_row(id)? else {
            return Ok(ClaimDecision::Skipped(DiscardReason::NotFound));
        };
        match row.begin_cycle(now, max_retries) {
            Ok(()) => {
                self.put_row(&row)?;
                Ok(ClaimDecision::Claimed(row))
            }
            Err(reason) => Ok(ClaimDecision::Skipped(reason)),
        }
    }

    async fn commit_cycle(
        &self,
        id: &SubscriptionId,
        outcome: &CycleOutcome,
        now: DateTime<Utc>,
        max_retries: u32,
    ) -> Result<Option<Subscription>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut row) = self.read_row(id)? else {
            return Ok(None);
        };
        row.finish_cycle(outcome, now, max_retries);
        self.put_row(&row)?;
        Ok(Some(row))
    }

    async fn deactivate(&self, id: &SubscriptionId) -> Result<Option<Subscription>> {
        let _guard = self.write_lock.lock().await;
        let Some(mut row) = self.read_row(id)? else {
            return Ok(None);
        };
        row.deactivate();
        self.put_row(&row)?;
        Ok(Some(row))
    }
}
