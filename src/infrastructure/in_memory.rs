use crate::domain::ports::SubscriptionStore;
use crate::domain::subscription::{
    ClaimDecision, CycleOutcome, DiscardReason, Subscription, SubscriptionId,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory subscription store.
///
/// The write lock spans each guard-check-and-mutate, which is exactly the
/// single-row atomicity the claim protocol needs. Suited to tests and
/// single-process deployments; durable storage lives behind the
/// `storage-rocksdb` feature.
#[derive(Default, Clone)]
pub struct InMemorySubscriptionStore {
    rows: Arc<RwLock<HashMap<SubscriptionId, Subscription>>>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn insert(&self, subscription: Subscription) -> Result<()> {
        let mut rows = self.rows.write().await;
        rows.insert(subscription.id, subscription);
        Ok(())
    }

    async fn get(&self, id: &SubscriptionId) -> Result<Option<Subscription>> {
        let rows = self.rows.read().await;
        Ok(rows.get(id).cloned())
    }

    async fn claim_cycle(
        &self,
        id: &SubscriptionId,
        now: DateTime<Utc>,
        max_retries: u32,
    ) -> Result<ClaimDecision> {
        let mut rows = self.rows.write().await;
        let Some(row) = rows.get_mut(id) else {
            return Ok(ClaimDecision::Skipped(DiscardReason::NotFound));
        };
        Ok(match row.begin_cycle(now, max_retries) {
            Ok(()) => ClaimDecision::Claimed(row.clone()),
            Err(reason) => ClaimDecision::Skipped(reason),
        })
    }

    async fn commit_cycle(
        &self,
        id: &SubscriptionId,
        outcome: &CycleOutcome,
        now: DateTime<Utc>,
        max_retries: u32,
    ) -> Result<Option<Subscription>> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(id).map(|row| {
            row.finish_cycle(outcome, now, max_retries);
            row.clone()
        }))
    }

    async fn deactivate(&self, id: &SubscriptionId) -> Result<Option<Subscription>> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(id).map(|row| {
            row.deactivate();
            row.clone()
        }))
    }
}
