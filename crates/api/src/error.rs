//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{CartError, DomainError};

const INTERNAL_MESSAGE: &str = "internal server error";
const CHECKOUT_INTERNAL_MESSAGE: &str = "Checkout failed due to internal error.";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request from the client.
    BadRequest(String),
    /// Missing, malformed, or expired credentials.
    Unauthorized(String),
    /// Authenticated but not allowed.
    Forbidden(String),
    /// Requested resource does not exist.
    NotFound(String),
    /// Cart, catalog, or account error.
    Domain(DomainError),
    /// Checkout error.
    Checkout(CheckoutError),
    /// Internal server error. The message is logged, never returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Cart(cart_err) => match cart_err {
            CartError::ProductNotFound(_) | CartError::ItemNotInCart(_) => {
                (StatusCode::NOT_FOUND, err.to_string())
            }
            CartError::InvalidQuantity { .. }
            | CartError::QuantityTooLarge { .. }
            | CartError::TotalTooLarge
            | CartError::InsufficientInventory { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        },
        DomainError::InvalidInput(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::InvalidCredentials => (StatusCode::UNAUTHORIZED, err.to_string()),
        DomainError::UsernameTaken(_) => (StatusCode::CONFLICT, err.to_string()),
        DomainError::PasswordHash(_) | DomainError::Store(_) => {
            tracing::error!(error = %err, "domain operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::CartNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::CartEmpty
        | CheckoutError::InsufficientInventory { .. }
        | CheckoutError::AmountOverflow => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::PaymentGateway(_) | CheckoutError::Store(_) => {
            tracing::error!(error = %err, "checkout failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                CHECKOUT_INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
