use super::dtos::{
    CancelSubscriptionResponse, CreateSubscriptionRequest, CreateSubscriptionResponse,
    SubscriptionView,
};
use super::validation::parse_recurrence_interval;
use super::{AppState, Success};
use crate::domain::payment::WalletCredential;
use crate::domain::ports::Trigger;
use crate::domain::subscription::{NewSubscription, Subscription, SubscriptionId};
use crate::error::{Result, ZapError};
use actix_web::{Responder, delete, get, post, web};
use std::time::Duration;

/// Creates a subscription and arms its first cycle immediately.
///
/// All validation happens here, before anything is persisted; the engine
/// never sees an invalid subscription.
#[post("")]
pub async fn create_subscription(
    state: web::Data<AppState>,
    request: web::Json<CreateSubscriptionRequest>,
) -> Result<impl Responder> {
    let request = request.into_inner();

    if request.amount == 0 {
        return Err(ZapError::BadRequest("amount must be positive".to_string()));
    }
    let recurrence_interval_secs = parse_recurrence_interval(&request.sleep_duration)?;
    let wallet_credential = WalletCredential::parse(&request.nostr_wallet_connect_url)
        .map_err(|err| ZapError::BadRequest(format!("invalid wallet connection URL: {}", err)))?;
    state
        .payments
        .validate_recipient(&request.recipient_lightning_address, request.amount)
        .await
        .map_err(|failure| ZapError::BadRequest(failure.reason()))?;

    let subscription = Subscription::new(NewSubscription {
        amount_sats: request.amount,
        recipient_address: request.recipient_lightning_address,
        wallet_credential,
        message: request.message,
        payer_data: request.payer_data,
        recurrence_interval_secs,
        email: request.email,
        send_payment_notifications: request.send_payment_notifications,
    });
    let subscription_id = subscription.id;

    state.store.insert(subscription).await?;
    state
        .bus
        .schedule_after(&subscription_id, Duration::ZERO, Trigger { subscription_id })
        .await?;

    log::info!("created subscription {}", subscription_id);
    Success::created(CreateSubscriptionResponse { subscription_id })
}

#[get("/{id}")]
pub async fn get_subscription(
    state: web::Data<AppState>,
    path: web::Path<SubscriptionId>,
) -> Result<impl Responder> {
    let id = path.into_inner();
    let subscription = state
        .store
        .get(&id)
        .await?
        .ok_or(ZapError::NotFound(id))?;
    Success::ok(SubscriptionView::from(subscription))
}

/// Cancels a subscription: suppresses scheduled triggers and flips the
/// authoritative `active` flag. Idempotent.
#[delete("/{id}")]
pub async fn cancel_subscription(
    state: web::Data<AppState>,
    path: web::Path<SubscriptionId>,
) -> Result<impl Responder> {
    let id = path.into_inner();
    let subscription = state.engine.cancel(&id).await?;
    Success::ok(CancelSubscriptionResponse {
        subscription_id: subscription.id,
        active: subscription.active,
    })
}
