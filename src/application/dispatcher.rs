use super::engine::RecurrenceEngine;
use crate::domain::ports::Trigger;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// Drains delivered triggers and runs one engine invocation per delivery.
///
/// Different subscriptions run concurrently; same-id races are resolved by
/// the engine's atomic claim, not here. Infrastructure faults are logged and
/// the loop keeps going; a failed cycle has not committed a terminal state
/// and is safe to redeliver.
pub async fn run(engine: Arc<RecurrenceEngine>, mut deliveries: UnboundedReceiver<Trigger>) {
    while let Some(trigger) = deliveries.recv().await {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let id = trigger.subscription_id;
            match engine.handle_trigger(trigger).await {
                Ok(status) => log::debug!("cycle for {}: {:?}", id, status),
                Err(err) => log::error!("cycle for {} hit an infrastructure fault: {}", id, err),
            }
        });
    }
    log::info!("trigger channel closed, dispatcher stopping");
}
