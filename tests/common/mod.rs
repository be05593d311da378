#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use zapcycle::application::engine::{EngineConfig, RecurrenceEngine};
use zapcycle::domain::notification::Notification;
use zapcycle::domain::payment::{
    PaymentFailure, PaymentProof, PaymentRequest, WalletCredential,
};
use zapcycle::domain::ports::{Notifier, PaymentClient, Trigger, TriggerBus};
use zapcycle::domain::subscription::{NewSubscription, Subscription, SubscriptionId};
use zapcycle::error::Result;
use zapcycle::infrastructure::in_memory::InMemorySubscriptionStore;

pub fn nwc_url() -> String {
    format!(
        "nostr+walletconnect://b889ff5b?relay=wss%3A%2F%2Frelay.damus.io&secret={}",
        "a".repeat(64)
    )
}

pub fn test_credential() -> WalletCredential {
    WalletCredential::parse(&nwc_url()).unwrap()
}

/// A fresh, active subscription with notifications opted in.
pub fn subscription(amount_sats: u64, recurrence_interval_secs: u64) -> Subscription {
    Subscription::new(NewSubscription {
        amount_sats,
        recipient_address: "alice@getalby.com".to_string(),
        wallet_credential: test_credential(),
        message: Some("keep up the good work".to_string()),
        payer_data: None,
        recurrence_interval_secs,
        email: Some("payer@example.com".to_string()),
        send_payment_notifications: true,
    })
}

pub fn trigger(subscription_id: SubscriptionId) -> Trigger {
    Trigger { subscription_id }
}

/// Payment client that replays scripted outcomes, then keeps succeeding.
#[derive(Default)]
pub struct ScriptedPaymentClient {
    outcomes: Mutex<VecDeque<std::result::Result<PaymentProof, PaymentFailure>>>,
    calls: AtomicUsize,
    recipient_failure: Option<PaymentFailure>,
}

impl ScriptedPaymentClient {
    pub fn always_succeeding() -> Self {
        Self::default()
    }

    pub fn scripted(
        outcomes: Vec<std::result::Result<PaymentProof, PaymentFailure>>,
    ) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    pub fn rejecting_recipient(failure: PaymentFailure) -> Self {
        Self {
            recipient_failure: Some(failure),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn proof() -> PaymentProof {
    PaymentProof {
        preimage: "00ff00ff".to_string(),
    }
}

pub fn failure(reason: &str) -> PaymentFailure {
    PaymentFailure::Rejected {
        code: None,
        message: Some(reason.to_string()),
    }
}

#[async_trait]
impl PaymentClient for ScriptedPaymentClient {
    async fn pay(
        &self,
        _request: &PaymentRequest,
    ) -> std::result::Result<PaymentProof, PaymentFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(proof()))
    }

    async fn validate_recipient(
        &self,
        _address: &str,
        _amount_sats: u64,
    ) -> std::result::Result<(), PaymentFailure> {
        match &self.recipient_failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

/// Payment client that parks inside `pay` until the test releases it, for
/// steering what happens while an attempt is in flight.
pub struct GatedPaymentClient {
    pub started: Semaphore,
    pub release: Semaphore,
}

impl GatedPaymentClient {
    pub fn new() -> Self {
        Self {
            started: Semaphore::new(0),
            release: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl PaymentClient for GatedPaymentClient {
    async fn pay(
        &self,
        _request: &PaymentRequest,
    ) -> std::result::Result<PaymentProof, PaymentFailure> {
        self.started.add_permits(1);
        let _release = self.release.acquire().await.unwrap();
        Ok(proof())
    }

    async fn validate_recipient(
        &self,
        _address: &str,
        _amount_sats: u64,
    ) -> std::result::Result<(), PaymentFailure> {
        Ok(())
    }
}

/// Notifier that records every delivery in order.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Notification)>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<&'static str> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, notification)| notification.kind())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, email: &str, notification: &Notification) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), notification.clone()));
        Ok(())
    }
}

/// Trigger bus that records scheduling without delivering anything.
#[derive(Default)]
pub struct RecordingBus {
    pub scheduled: Mutex<Vec<(SubscriptionId, Duration)>>,
    pub cancelled: Mutex<Vec<SubscriptionId>>,
}

#[async_trait]
impl TriggerBus for RecordingBus {
    async fn schedule_after(
        &self,
        key: &SubscriptionId,
        delay: Duration,
        _trigger: Trigger,
    ) -> Result<()> {
        self.scheduled.lock().unwrap().push((*key, delay));
        Ok(())
    }

    async fn cancel_all(&self, key: &SubscriptionId) -> Result<()> {
        self.cancelled.lock().unwrap().push(*key);
        Ok(())
    }
}

pub struct Harness {
    pub engine: Arc<RecurrenceEngine>,
    pub store: Arc<InMemorySubscriptionStore>,
    pub payments: Arc<ScriptedPaymentClient>,
    pub notifier: Arc<RecordingNotifier>,
    pub bus: Arc<RecordingBus>,
}

pub fn harness(payments: ScriptedPaymentClient, max_retries: u32) -> Harness {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let payments = Arc::new(payments);
    let notifier = Arc::new(RecordingNotifier::default());
    let bus = Arc::new(RecordingBus::default());
    let engine = Arc::new(RecurrenceEngine::new(
        store.clone(),
        payments.clone(),
        notifier.clone(),
        bus.clone(),
        EngineConfig { max_retries },
    ));
    Harness {
        engine,
        store,
        payments,
        notifier,
        bus,
    }
}
