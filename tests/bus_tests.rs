mod common;

use common::trigger;
use std::sync::Arc;
use std::time::Duration;
use zapcycle::domain::ports::TriggerBus;
use zapcycle::domain::subscription::SubscriptionId;
use zapcycle::infrastructure::trigger::TokioTriggerBus;

#[tokio::test(start_paused = true)]
async fn delivers_no_earlier_than_the_delay() {
    let (bus, mut deliveries) = TokioTriggerBus::new();
    let id = SubscriptionId::new();

    let started = tokio::time::Instant::now();
    bus.schedule_after(&id, Duration::from_secs(60), trigger(id))
        .await
        .unwrap();

    let delivered = deliveries.recv().await.unwrap();
    assert_eq!(delivered.subscription_id, id);
    assert!(started.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn zero_delay_delivers_immediately() {
    let (bus, mut deliveries) = TokioTriggerBus::new();
    let id = SubscriptionId::new();

    bus.schedule_after(&id, Duration::ZERO, trigger(id))
        .await
        .unwrap();
    assert_eq!(deliveries.recv().await.unwrap().subscription_id, id);
}

#[tokio::test(start_paused = true)]
async fn duplicate_schedules_both_deliver() {
    let (bus, mut deliveries) = TokioTriggerBus::new();
    let id = SubscriptionId::new();

    bus.schedule_after(&id, Duration::from_secs(1), trigger(id))
        .await
        .unwrap();
    bus.schedule_after(&id, Duration::from_secs(1), trigger(id))
        .await
        .unwrap();

    assert!(deliveries.recv().await.is_some());
    assert!(deliveries.recv().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn cancel_all_suppresses_pending_deliveries() {
    let (bus, mut deliveries) = TokioTriggerBus::new();
    let id = SubscriptionId::new();

    bus.schedule_after(&id, Duration::from_secs(60), trigger(id))
        .await
        .unwrap();
    bus.schedule_after(&id, Duration::from_secs(120), trigger(id))
        .await
        .unwrap();
    bus.cancel_all(&id).await.unwrap();

    let nothing = tokio::time::timeout(Duration::from_secs(600), deliveries.recv()).await;
    assert!(nothing.is_err(), "cancelled trigger was still delivered");
}

#[tokio::test(start_paused = true)]
async fn cancel_all_without_pending_deliveries_is_safe() {
    let (bus, _deliveries) = TokioTriggerBus::new();
    bus.cancel_all(&SubscriptionId::new()).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancellation_is_scoped_to_its_key() {
    let (bus, mut deliveries) = TokioTriggerBus::new();
    let bus = Arc::new(bus);
    let cancelled = SubscriptionId::new();
    let kept = SubscriptionId::new();

    bus.schedule_after(&cancelled, Duration::from_secs(10), trigger(cancelled))
        .await
        .unwrap();
    bus.schedule_after(&kept, Duration::from_secs(20), trigger(kept))
        .await
        .unwrap();
    bus.cancel_all(&cancelled).await.unwrap();

    let delivered = deliveries.recv().await.unwrap();
    assert_eq!(delivered.subscription_id, kept);

    let nothing = tokio::time::timeout(Duration::from_secs(600), deliveries.recv()).await;
    assert!(nothing.is_err());
}
