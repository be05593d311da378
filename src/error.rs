use crate::domain::subscription::SubscriptionId;
use actix_web::{HttpResponse, http::StatusCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ZapError>;

#[derive(Error, Debug)]
pub enum ZapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("scheduling error: {0}")]
    Scheduling(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("subscription {0} not found")]
    NotFound(SubscriptionId),
    #[error("internal error: {0}")]
    Internal(String),
}

impl actix_web::ResponseError for ZapError {
    fn status_code(&self) -> StatusCode {
        match self {
            ZapError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ZapError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ZapError::BadRequest(_) | ZapError::NotFound(_) => {
                HttpResponse::build(self.status_code())
                    .json(serde_json::json!({ "error": self.to_string() }))
            }
            other => {
                log::error!("request failed: {}", other);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "Internal server error" }))
            }
        }
    }
}
