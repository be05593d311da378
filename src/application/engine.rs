use crate::domain::notification::Notification;
use crate::domain::ports::{
    NotifierRef, PaymentClientRef, SubscriptionStoreRef, Trigger, TriggerBusRef,
};
use crate::domain::subscription::{
    ClaimDecision, CycleOutcome, DiscardReason, Subscription, SubscriptionId,
};
use crate::error::{Result, ZapError};
use chrono::Utc;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Consecutive failures tolerated before permanent deactivation.
    pub max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

/// How a delivered trigger ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleStatus {
    /// No attempt ran; duplicate, early, unknown or deactivated subscription.
    Discarded(DiscardReason),
    /// Outcome committed and the next trigger scheduled one interval out.
    Rearmed(CycleOutcome),
    /// The row went inactive this cycle, by retry exhaustion or by a
    /// concurrent cancellation; no further triggers.
    Deactivated(CycleOutcome),
}

/// The recurring execution engine.
///
/// Invoked once per delivered trigger. Deliveries for different subscriptions
/// run fully in parallel; deliveries for the same subscription are serialized
/// only by the store's atomic cycle claim and the `active` flag.
pub struct RecurrenceEngine {
    store: SubscriptionStoreRef,
    payments: PaymentClientRef,
    notifier: NotifierRef,
    bus: TriggerBusRef,
    config: EngineConfig,
}

impl RecurrenceEngine {
    pub fn new(
        store: SubscriptionStoreRef,
        payments: PaymentClientRef,
        notifier: NotifierRef,
        bus: TriggerBusRef,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            payments,
            notifier,
            bus,
            config,
        }
    }

    /// Runs one attempt cycle for a delivered trigger.
    ///
    /// Payment failures are counted outcomes and never escape as errors; an
    /// `Err` from here is an infrastructure fault (store or bus) and means the
    /// cycle did not reach a terminal state. A crash after the claim commits
    /// but before the re-arm leaves the subscription without a pending
    /// trigger; recovering those requires a reconciliation sweep that
    /// re-triggers active subscriptions past their due time.
    pub async fn handle_trigger(&self, trigger: Trigger) -> Result<CycleStatus> {
        let id = trigger.subscription_id;
        let now = Utc::now();

        // Guards and claim run atomically inside the store; a concurrent
        // duplicate delivery loses the claim and lands in Skipped.
        let claim = self
            .store
            .claim_cycle(&id, now, self.config.max_retries)
            .await?;
        let subscription = match claim {
            ClaimDecision::Claimed(subscription) => subscription,
            ClaimDecision::Skipped(reason) => {
                log::debug!("discarding trigger for {}: {}", id, reason);
                return Ok(CycleStatus::Discarded(reason));
            }
        };

        // A success this cycle ends a failure streak of this length.
        let prior_failures = subscription.retry_count;

        let outcome = match self.payments.pay(&subscription.payment_request()).await {
            Ok(proof) => {
                log::info!(
                    "paid {} sats to {} for {}",
                    subscription.amount_sats,
                    subscription.recipient_address,
                    id
                );
                CycleOutcome::Success {
                    preimage: proof.preimage,
                }
            }
            Err(failure) => {
                let reason = failure.reason();
                log::warn!(
                    "payment attempt {} for {} failed: {}",
                    subscription.retry_count + 1,
                    id,
                    reason
                );
                CycleOutcome::Failure { reason }
            }
        };

        let updated = self
            .store
            .commit_cycle(&id, &outcome, Utc::now(), self.config.max_retries)
            .await?
            .ok_or_else(|| ZapError::Storage(format!("subscription {} vanished mid-cycle", id)))?;

        self.send_cycle_notifications(&updated, &outcome, prior_failures)
            .await;

        if updated.active {
            self.bus
                .schedule_after(&id, updated.recurrence_interval(), trigger)
                .await?;
            Ok(CycleStatus::Rearmed(outcome))
        } else {
            // Inactive without exhaustion means a cancel landed while the
            // attempt was in flight; the exhaustion notice stays reserved
            // for a failure that spent the retry budget.
            let exhausted = matches!(outcome, CycleOutcome::Failure { .. })
                && updated.retry_count >= self.config.max_retries;
            if exhausted {
                self.send_deactivation_notice(&updated).await;
            }
            Ok(CycleStatus::Deactivated(outcome))
        }
    }

    /// Cancels a subscription: best-effort suppression at the bus, then the
    /// authoritative `active = false` that step one of every cycle checks.
    /// Idempotent and safe to race against an executing cycle.
    pub async fn cancel(&self, id: &SubscriptionId) -> Result<Subscription> {
        self.bus.cancel_all(id).await?;
        let updated = self
            .store
            .deactivate(id)
            .await?
            .ok_or(ZapError::NotFound(*id))?;
        log::info!("cancelled subscription {}", id);
        Ok(updated)
    }

    /// Routine per-cycle notifications, gated on the user's opt-in. The
    /// recovered notice always precedes the outcome notice.
    async fn send_cycle_notifications(
        &self,
        updated: &Subscription,
        outcome: &CycleOutcome,
        prior_failures: u32,
    ) {
        let Some(email) = updated.notification_email() else {
            return;
        };

        match outcome {
            CycleOutcome::Success { .. } => {
                if prior_failures > 0 {
                    self.deliver(
                        email,
                        Notification::PaymentRecovered {
                            recipient: updated.recipient_address.clone(),
                            failed_attempts: prior_failures,
                        },
                    )
                    .await;
                }
                self.deliver(
                    email,
                    Notification::PaymentSucceeded {
                        amount_sats: updated.amount_sats,
                        recipient: updated.recipient_address.clone(),
                    },
                )
                .await;
            }
            CycleOutcome::Failure { reason } => {
                self.deliver(
                    email,
                    Notification::PaymentFailed {
                        amount_sats: updated.amount_sats,
                        recipient: updated.recipient_address.clone(),
                        reason: reason.clone(),
                        attempts_left: self.config.max_retries.saturating_sub(updated.retry_count),
                    },
                )
                .await;
            }
        }
    }

    /// The exhaustion notice ignores the notification opt-in: deactivation is
    /// always surfaced when an email is on file.
    async fn send_deactivation_notice(&self, updated: &Subscription) {
        let Some(email) = updated.email.as_deref() else {
            return;
        };
        self.deliver(
            email,
            Notification::SubscriptionDeactivated {
                recipient: updated.recipient_address.clone(),
                reason: format!(
                    "{} consecutive failed payment attempts",
                    updated.retry_count
                ),
            },
        )
        .await;
    }

    async fn deliver(&self, email: &str, notification: Notification) {
        if let Err(err) = self.notifier.notify(email, &notification).await {
            log::warn!(
                "could not deliver {} notification to {}: {}",
                notification.kind(),
                email,
                err
            );
        }
    }
}
