use super::notification::Notification;
use super::payment::{PaymentFailure, PaymentProof, PaymentRequest};
use super::subscription::{ClaimDecision, CycleOutcome, Subscription, SubscriptionId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// The message a trigger bus delivers to the engine. Nothing but the
/// subscription id crosses this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub subscription_id: SubscriptionId,
}

/// Durable keyed storage for subscriptions.
///
/// Every mutating operation is a single-row atomic read-modify-write; the row
/// logic itself lives on [`Subscription`] so all backends share it.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn insert(&self, subscription: Subscription) -> Result<()>;

    async fn get(&self, id: &SubscriptionId) -> Result<Option<Subscription>>;

    /// Runs the cycle guards and claims the cycle when they pass
    /// ([`Subscription::begin_cycle`]). Guards and claim write must be atomic
    /// per row: of concurrent duplicate deliveries exactly one may win.
    async fn claim_cycle(
        &self,
        id: &SubscriptionId,
        now: DateTime<Utc>,
        max_retries: u32,
    ) -> Result<ClaimDecision>;

    /// Commits a terminal attempt outcome ([`Subscription::finish_cycle`]) and
    /// returns the updated row.
    async fn commit_cycle(
        &self,
        id: &SubscriptionId,
        outcome: &CycleOutcome,
        now: DateTime<Utc>,
        max_retries: u32,
    ) -> Result<Option<Subscription>>;

    /// Marks the subscription inactive; idempotent. Returns the updated row.
    async fn deactivate(&self, id: &SubscriptionId) -> Result<Option<Subscription>>;
}

/// Executes a single payment attempt against a recipient address.
///
/// Implementations must bound `pay` with a timeout and classify it as
/// [`PaymentFailure::Timeout`]; the engine never retries within a cycle.
#[async_trait]
pub trait PaymentClient: Send + Sync {
    async fn pay(
        &self,
        request: &PaymentRequest,
    ) -> std::result::Result<PaymentProof, PaymentFailure>;

    /// Creation-time check that the recipient can receive `amount_sats`.
    async fn validate_recipient(
        &self,
        address: &str,
        amount_sats: u64,
    ) -> std::result::Result<(), PaymentFailure>;
}

/// Delivers typed notifications for a subscription. Fire-and-forget from the
/// engine's perspective: errors are logged by the caller, never acted on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, email: &str, notification: &Notification) -> Result<()>;
}

/// Durable, at-least-once delayed-delivery channel keyed by subscription id.
#[async_trait]
pub trait TriggerBus: Send + Sync {
    /// Delivers `trigger` to the engine no earlier than `delay` from now.
    /// Deliveries may be duplicated and may outlive the scheduling process.
    async fn schedule_after(
        &self,
        key: &SubscriptionId,
        delay: Duration,
        trigger: Trigger,
    ) -> Result<()>;

    /// Best-effort suppression of pending and future deliveries for `key`.
    /// Safe with nothing pending. An in-flight delivery may still slip
    /// through; the engine's `active` guard is the authoritative stop.
    async fn cancel_all(&self, key: &SubscriptionId) -> Result<()>;
}

pub type SubscriptionStoreRef = Arc<dyn SubscriptionStore>;
pub type PaymentClientRef = Arc<dyn PaymentClient>;
pub type NotifierRef = Arc<dyn Notifier>;
pub type TriggerBusRef = Arc<dyn TriggerBus>;
