use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::payment::{PaymentRequest, WalletCredential};

/// Minimum recurrence interval accepted at creation time.
pub const MIN_RECURRENCE_INTERVAL_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SubscriptionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Why a delivered trigger was dropped without running a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscardReason {
    NotFound,
    Inactive,
    RetriesExhausted,
    NotDue { due_at: DateTime<Utc> },
}

impl fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscardReason::NotFound => write!(f, "subscription not found"),
            DiscardReason::Inactive => write!(f, "subscription is inactive"),
            DiscardReason::RetriesExhausted => write!(f, "retry limit already reached"),
            DiscardReason::NotDue { due_at } => write!(f, "next cycle not due before {}", due_at),
        }
    }
}

/// Result of attempting to claim a cycle for a subscription row.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimDecision {
    /// The claim won; the snapshot has `last_event` already advanced.
    Claimed(Subscription),
    Skipped(DiscardReason),
}

/// Terminal result of a single payment attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Success { preimage: String },
    Failure { reason: String },
}

/// Fields supplied by the creation endpoint; everything else starts zeroed.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub amount_sats: u64,
    pub recipient_address: String,
    pub wallet_credential: WalletCredential,
    pub message: Option<String>,
    pub payer_data: Option<serde_json::Value>,
    pub recurrence_interval_secs: u64,
    pub email: Option<String>,
    pub send_payment_notifications: bool,
}

/// A recurring payment subscription.
///
/// Amount, recipient, credential and interval are immutable after creation;
/// the engine only ever touches the counters, the timestamps and `active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub amount_sats: u64,
    pub recipient_address: String,
    pub wallet_credential: WalletCredential,
    pub message: Option<String>,
    pub payer_data: Option<serde_json::Value>,
    pub recurrence_interval_secs: u64,
    /// Consecutive failures since the last success.
    pub retry_count: u32,
    pub num_successful_payments: u64,
    pub num_failed_payments: u64,
    /// Start of the most recent attempt; the claim timestamp.
    pub last_event: Option<DateTime<Utc>>,
    pub last_successful_payment: Option<DateTime<Utc>>,
    pub last_failed_payment: Option<DateTime<Utc>>,
    pub email: Option<String>,
    pub send_payment_notifications: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn new(fields: NewSubscription) -> Self {
        Self {
            id: SubscriptionId::new(),
            amount_sats: fields.amount_sats,
            recipient_address: fields.recipient_address,
            wallet_credential: fields.wallet_credential,
            message: fields.message,
            payer_data: fields.payer_data,
            recurrence_interval_secs: fields.recurrence_interval_secs,
            retry_count: 0,
            num_successful_payments: 0,
            num_failed_payments: 0,
            last_event: None,
            last_successful_payment: None,
            last_failed_payment: None,
            email: fields.email,
            send_payment_notifications: fields.send_payment_notifications,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn recurrence_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.recurrence_interval_secs)
    }

    fn interval(&self) -> TimeDelta {
        TimeDelta::seconds(self.recurrence_interval_secs as i64)
    }

    /// When the next cycle becomes due, if a cycle has ever started.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.last_event.map(|started| started + self.interval())
    }

    /// Runs the cycle guards and, if they all pass, claims the cycle by
    /// advancing `last_event` to `now`.
    ///
    /// Must execute under the store's single-row atomicity so that of any
    /// concurrent duplicate deliveries exactly one claim wins; the losers see
    /// the advanced `last_event` and discard.
    pub fn begin_cycle(
        &mut self,
        now: DateTime<Utc>,
        max_retries: u32,
    ) -> std::result::Result<(), DiscardReason> {
        if !self.active {
            return Err(DiscardReason::Inactive);
        }
        if self.retry_count >= max_retries {
            // Should be unreachable: exhaustion deactivates on commit.
            return Err(DiscardReason::RetriesExhausted);
        }
        if let Some(due_at) = self.next_due()
            && now < due_at
        {
            return Err(DiscardReason::NotDue { due_at });
        }
        self.last_event = Some(now);
        Ok(())
    }

    /// Commits one terminal attempt outcome.
    ///
    /// A failure that reaches `max_retries` consecutive misses deactivates the
    /// subscription in the same write, so exhaustion is never observable as an
    /// active row.
    pub fn finish_cycle(&mut self, outcome: &CycleOutcome, now: DateTime<Utc>, max_retries: u32) {
        match outcome {
            CycleOutcome::Success { .. } => {
                self.retry_count = 0;
                self.num_successful_payments += 1;
                self.last_successful_payment = Some(now);
            }
            CycleOutcome::Failure { .. } => {
                self.retry_count += 1;
                self.num_failed_payments += 1;
                self.last_failed_payment = Some(now);
                if self.retry_count >= max_retries {
                    self.active = false;
                }
            }
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Recipient of routine payment notifications, honoring the opt-in flag.
    pub fn notification_email(&self) -> Option<&str> {
        if self.send_payment_notifications {
            self.email.as_deref()
        } else {
            None
        }
    }

    pub fn payment_request(&self) -> PaymentRequest {
        PaymentRequest {
            credential: self.wallet_credential.clone(),
            recipient: self.recipient_address.clone(),
            amount_sats: self.amount_sats,
            comment: self.message.clone(),
            payer_data: self.payer_data.clone(),
        }
    }
}
