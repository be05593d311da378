mod common;

use common::{ScriptedPaymentClient, failure, harness, proof, subscription, trigger};
use std::time::Duration;
use zapcycle::application::engine::CycleStatus;
use zapcycle::domain::ports::SubscriptionStore;
use zapcycle::domain::subscription::{CycleOutcome, DiscardReason};

#[tokio::test]
async fn first_cycle_pays_and_rearms_one_interval_out() {
    let h = harness(ScriptedPaymentClient::always_succeeding(), 3);
    let sub = subscription(1000, 24 * 60 * 60);
    let id = sub.id;
    h.store.insert(sub).await.unwrap();

    let status = h.engine.handle_trigger(trigger(id)).await.unwrap();
    assert!(matches!(
        status,
        CycleStatus::Rearmed(CycleOutcome::Success { .. })
    ));

    let row = h.store.get(&id).await.unwrap().unwrap();
    assert_eq!(row.num_successful_payments, 1);
    assert_eq!(row.num_failed_payments, 0);
    assert_eq!(row.retry_count, 0);
    assert!(row.last_event.is_some());
    assert!(row.last_successful_payment.is_some());
    assert!(row.active);

    assert_eq!(h.payments.calls(), 1);
    assert_eq!(
        h.bus.scheduled.lock().unwrap().as_slice(),
        &[(id, Duration::from_secs(24 * 60 * 60))]
    );
    assert_eq!(h.notifier.kinds(), vec!["succeeded"]);
}

#[tokio::test]
async fn early_duplicate_trigger_is_discarded() {
    let h = harness(ScriptedPaymentClient::always_succeeding(), 3);
    let sub = subscription(1000, 24 * 60 * 60);
    let id = sub.id;
    h.store.insert(sub).await.unwrap();

    h.engine.handle_trigger(trigger(id)).await.unwrap();
    // Redelivered well before the next due time.
    let status = h.engine.handle_trigger(trigger(id)).await.unwrap();

    assert!(matches!(
        status,
        CycleStatus::Discarded(DiscardReason::NotDue { .. })
    ));
    assert_eq!(h.payments.calls(), 1);
    assert_eq!(h.bus.scheduled.lock().unwrap().len(), 1);

    let row = h.store.get(&id).await.unwrap().unwrap();
    assert_eq!(row.num_successful_payments, 1);
    assert_eq!(row.num_failed_payments, 0);
}

#[tokio::test]
async fn concurrent_duplicate_triggers_pay_exactly_once() {
    let h = harness(ScriptedPaymentClient::always_succeeding(), 3);
    let sub = subscription(1000, 24 * 60 * 60);
    let id = sub.id;
    h.store.insert(sub).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..6 {
        let engine = h.engine.clone();
        tasks.push(tokio::spawn(
            async move { engine.handle_trigger(trigger(id)).await },
        ));
    }
    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap().unwrap());
    }

    let attempts = statuses
        .iter()
        .filter(|status| matches!(status, CycleStatus::Rearmed(_)))
        .count();
    assert_eq!(attempts, 1);
    assert_eq!(h.payments.calls(), 1);

    let row = h.store.get(&id).await.unwrap().unwrap();
    assert_eq!(row.num_successful_payments, 1);
    assert_eq!(h.bus.scheduled.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failure_counts_and_rearms_on_the_same_cadence() {
    let h = harness(
        ScriptedPaymentClient::scripted(vec![Err(failure("no route to recipient"))]),
        3,
    );
    let sub = subscription(1000, 6 * 60 * 60);
    let id = sub.id;
    h.store.insert(sub).await.unwrap();

    let status = h.engine.handle_trigger(trigger(id)).await.unwrap();
    assert_eq!(
        status,
        CycleStatus::Rearmed(CycleOutcome::Failure {
            reason: "no route to recipient".to_string()
        })
    );

    let row = h.store.get(&id).await.unwrap().unwrap();
    assert_eq!(row.retry_count, 1);
    assert_eq!(row.num_failed_payments, 1);
    assert!(row.active);

    // No backoff: the retry is scheduled on the normal interval.
    assert_eq!(
        h.bus.scheduled.lock().unwrap().as_slice(),
        &[(id, Duration::from_secs(6 * 60 * 60))]
    );
    assert_eq!(h.notifier.kinds(), vec!["failed"]);
}

#[tokio::test]
async fn recovery_notice_precedes_the_success_notice() {
    let h = harness(ScriptedPaymentClient::scripted(vec![Ok(proof())]), 3);
    let mut sub = subscription(1000, 24 * 60 * 60);
    sub.retry_count = 1;
    sub.num_failed_payments = 1;
    let id = sub.id;
    h.store.insert(sub).await.unwrap();

    h.engine.handle_trigger(trigger(id)).await.unwrap();

    let row = h.store.get(&id).await.unwrap().unwrap();
    assert_eq!(row.retry_count, 0);
    assert_eq!(row.num_successful_payments, 1);
    assert_eq!(h.notifier.kinds(), vec!["recovered", "succeeded"]);
}

#[tokio::test]
async fn trigger_for_deactivated_subscription_is_a_pure_noop() {
    let h = harness(ScriptedPaymentClient::always_succeeding(), 3);
    let mut sub = subscription(1000, 24 * 60 * 60);
    sub.deactivate();
    let id = sub.id;
    h.store.insert(sub.clone()).await.unwrap();

    let status = h.engine.handle_trigger(trigger(id)).await.unwrap();
    assert_eq!(status, CycleStatus::Discarded(DiscardReason::Inactive));

    assert_eq!(h.payments.calls(), 0);
    assert!(h.notifier.sent.lock().unwrap().is_empty());
    assert!(h.bus.scheduled.lock().unwrap().is_empty());
    // Not a single field moved.
    assert_eq!(h.store.get(&id).await.unwrap(), Some(sub));
}

#[tokio::test]
async fn trigger_for_unknown_subscription_is_discarded() {
    let h = harness(ScriptedPaymentClient::always_succeeding(), 3);
    let status = h
        .engine
        .handle_trigger(trigger(zapcycle::domain::subscription::SubscriptionId::new()))
        .await
        .unwrap();
    assert_eq!(status, CycleStatus::Discarded(DiscardReason::NotFound));
    assert_eq!(h.payments.calls(), 0);
}

#[tokio::test]
async fn notifications_respect_the_opt_out() {
    let h = harness(ScriptedPaymentClient::always_succeeding(), 3);
    let mut sub = subscription(1000, 24 * 60 * 60);
    sub.send_payment_notifications = false;
    let id = sub.id;
    h.store.insert(sub).await.unwrap();

    h.engine.handle_trigger(trigger(id)).await.unwrap();
    assert!(h.notifier.sent.lock().unwrap().is_empty());
}
