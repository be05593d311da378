pub mod dtos;
pub mod routes;
pub mod validation;

use crate::application::engine::RecurrenceEngine;
use crate::domain::ports::{PaymentClientRef, SubscriptionStoreRef, TriggerBusRef};
use crate::error::Result;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::sync::Arc;

/// Shared handler state.
pub struct AppState {
    pub store: SubscriptionStoreRef,
    pub payments: PaymentClientRef,
    pub bus: TriggerBusRef,
    pub engine: Arc<RecurrenceEngine>,
}

pub struct Success;

impl Success {
    pub fn created<T: Serialize>(body: T) -> Result<impl Responder> {
        Ok(HttpResponse::Created().json(body))
    }

    pub fn ok<T: Serialize>(body: T) -> Result<impl Responder> {
        Ok(HttpResponse::Ok().json(body))
    }
}

pub fn mount() -> actix_web::Scope {
    web::scope("/subscriptions")
        .service(routes::create_subscription)
        .service(routes::get_subscription)
        .service(routes::cancel_subscription)
}
