use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diesel::result::DatabaseErrorKind;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::aliases::DieselError;

/// Standard response envelope shared by every route.
#[derive(Serialize, Debug, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Every failure a core operation can surface to its caller. The UI layer
/// branches on the `error` slug in the response body, not on message text.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Offer not found")]
    OfferNotFound,
    #[error("Not enough stock left for the requested quantity")]
    InsufficientStock,
    #[error("Pickup code not found")]
    CodeNotFound,
    #[error("Order has already been picked up")]
    AlreadyPickedUp,
    #[error("Order has been cancelled")]
    OrderCancelled,
    #[error("Order not found")]
    OrderNotFound,
    #[error("Order cannot be cancelled from status {0}")]
    InvalidState(String),
    #[error("A concurrent update won the race, retry the operation")]
    StorageConflict,
    #[error("Settlement refused: {0}")]
    SettlementRefused(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Missing or invalid identity header")]
    Unauthorized,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable slug for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::OfferNotFound => "offer_not_found",
            AppError::InsufficientStock => "insufficient_stock",
            AppError::CodeNotFound => "code_not_found",
            AppError::AlreadyPickedUp => "already_picked_up",
            AppError::OrderCancelled => "order_cancelled",
            AppError::OrderNotFound => "order_not_found",
            AppError::InvalidState(_) => "invalid_state",
            AppError::StorageConflict => "storage_conflict",
            AppError::SettlementRefused(_) => "settlement_refused",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized => "unauthorized",
            AppError::Other(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::OfferNotFound | AppError::CodeNotFound | AppError::OrderNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::InsufficientStock
            | AppError::AlreadyPickedUp
            | AppError::OrderCancelled
            | AppError::StorageConflict => StatusCode::CONFLICT,
            AppError::InvalidState(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SettlementRefused(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Other(err) = &self {
            tracing::error!("Internal error: {err:#}");
        }

        let body = Json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));

        (self.status_code(), body).into_response()
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            // A serialization failure or a unique-key collision means the
            // whole operation lost a race and is safe to run again.
            DieselError::DatabaseError(
                DatabaseErrorKind::SerializationFailure | DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::StorageConflict,
            other => AppError::Other(other.into()),
        }
    }
}
