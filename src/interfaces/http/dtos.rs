use crate::domain::subscription::{Subscription, SubscriptionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Sats per attempt.
    pub amount: u64,
    pub recipient_lightning_address: String,
    pub nostr_wallet_connect_url: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub payer_data: Option<serde_json::Value>,
    /// Recurrence interval, e.g. "24h", "7d", "90m". Minimum one hour.
    pub sleep_duration: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub send_payment_notifications: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateSubscriptionResponse {
    pub subscription_id: SubscriptionId,
}

#[derive(Debug, Serialize)]
pub struct CancelSubscriptionResponse {
    pub subscription_id: SubscriptionId,
    pub active: bool,
}

/// Read view of a subscription. The wallet credential stays server-side.
#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub subscription_id: SubscriptionId,
    pub amount: u64,
    pub recipient_lightning_address: String,
    pub message: Option<String>,
    pub recurrence_interval_secs: u64,
    pub retry_count: u32,
    pub num_successful_payments: u64,
    pub num_failed_payments: u64,
    pub last_event: Option<DateTime<Utc>>,
    pub last_successful_payment: Option<DateTime<Utc>>,
    pub last_failed_payment: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionView {
    fn from(subscription: Subscription) -> Self {
        Self {
            subscription_id: subscription.id,
            amount: subscription.amount_sats,
            recipient_lightning_address: subscription.recipient_address,
            message: subscription.message,
            recurrence_interval_secs: subscription.recurrence_interval_secs,
            retry_count: subscription.retry_count,
            num_successful_payments: subscription.num_successful_payments,
            num_failed_payments: subscription.num_failed_payments,
            last_event: subscription.last_event,
            last_successful_payment: subscription.last_successful_payment,
            last_failed_payment: subscription.last_failed_payment,
            active: subscription.active,
            created_at: subscription.created_at,
        }
    }
}
