use crate::domain::ports::{Trigger, TriggerBus};
use crate::domain::subscription::SubscriptionId;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;

/// In-process trigger bus on tokio timers.
///
/// Each `schedule_after` spawns a sleeper that pushes the trigger into the
/// delivery channel; `cancel_all` aborts a key's sleepers. The timers do not
/// survive a restart, so this bus only satisfies the durable at-least-once
/// contract together with a reconciliation sweep or an external queue; the
/// engine is written against the contract, not against this implementation.
pub struct TokioTriggerBus {
    deliveries: UnboundedSender<Trigger>,
    pending: Arc<RwLock<HashMap<SubscriptionId, Vec<AbortHandle>>>>,
}

impl TokioTriggerBus {
    /// Creates the bus and the receiving end the dispatcher drains.
    pub fn new() -> (Self, UnboundedReceiver<Trigger>) {
        let (deliveries, receiver) = mpsc::unbounded_channel();
        (
            Self {
                deliveries,
                pending: Arc::new(RwLock::new(HashMap::new())),
            },
            receiver,
        )
    }
}

#[async_trait]
impl TriggerBus for TokioTriggerBus {
    async fn schedule_after(
        &self,
        key: &SubscriptionId,
        delay: Duration,
        trigger: Trigger,
    ) -> Result<()> {
        let deliveries = self.deliveries.clone();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            // Receiver gone means the process is shutting down.
            let _ = deliveries.send(trigger);
        });

        let mut pending = self.pending.write().await;
        // Sweep handles whose sleeper already delivered, dropping emptied
        // keys so terminated subscriptions do not accumulate.
        pending.retain(|_, handles| {
            handles.retain(|h| !h.is_finished());
            !handles.is_empty()
        });
        pending.entry(*key).or_default().push(handle.abort_handle());
        Ok(())
    }

    async fn cancel_all(&self, key: &SubscriptionId) -> Result<()> {
        if let Some(handles) = self.pending.write().await.remove(key) {
            for handle in handles {
                handle.abort();
            }
        }
        Ok(())
    }
}
