/// User-facing state-change notifications.
///
/// Rendering is intentionally plain text; anything fancier belongs to the
/// mail provider, not the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    PaymentSucceeded {
        amount_sats: u64,
        recipient: String,
    },
    PaymentFailed {
        amount_sats: u64,
        recipient: String,
        reason: String,
        attempts_left: u32,
    },
    /// A success that ended a streak of failures. Always sent before the
    /// succeeded notification of the same cycle.
    PaymentRecovered {
        recipient: String,
        failed_attempts: u32,
    },
    /// Sent on retry exhaustion regardless of the notification opt-in.
    SubscriptionDeactivated {
        recipient: String,
        reason: String,
    },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::PaymentSucceeded { .. } => "succeeded",
            Notification::PaymentFailed { .. } => "failed",
            Notification::PaymentRecovered { .. } => "recovered",
            Notification::SubscriptionDeactivated { .. } => "deactivated",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Notification::PaymentSucceeded {
                amount_sats,
                recipient,
            } => format!("Zap sent: {} sats to {}", amount_sats, recipient),
            Notification::PaymentFailed { recipient, .. } => {
                format!("Zap to {} failed", recipient)
            }
            Notification::PaymentRecovered { recipient, .. } => {
                format!("Zaps to {} recovered", recipient)
            }
            Notification::SubscriptionDeactivated { recipient, .. } => {
                format!("Subscription to {} deactivated", recipient)
            }
        }
    }

    pub fn body(&self) -> String {
        match self {
            Notification::PaymentSucceeded {
                amount_sats,
                recipient,
            } => format!(
                "Your recurring payment of {} sats to {} went through.",
                amount_sats, recipient
            ),
            Notification::PaymentFailed {
                amount_sats,
                recipient,
                reason,
                attempts_left,
            } => format!(
                "Your recurring payment of {} sats to {} failed: {}. \
                 {} attempt(s) left before the subscription is deactivated.",
                amount_sats, recipient, reason, attempts_left
            ),
            Notification::PaymentRecovered {
                recipient,
                failed_attempts,
            } => format!(
                "Payments to {} are flowing again after {} failed attempt(s).",
                recipient, failed_attempts
            ),
            Notification::SubscriptionDeactivated { recipient, reason } => format!(
                "Your subscription paying {} has been deactivated: {}. \
                 No further payments will be attempted.",
                recipient, reason
            ),
        }
    }
}
