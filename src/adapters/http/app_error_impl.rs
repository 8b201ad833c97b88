use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use billing_types::ErrorResponse;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        match self {
            AppError::Database(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError, None)
            }
            AppError::InvalidCredentials => {
                error_resp(StatusCode::UNAUTHORIZED, ErrorCode::InvalidCredentials, None)
            }
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None),
            AppError::OwnershipMismatch => error_resp(
                StatusCode::FORBIDDEN,
                ErrorCode::OwnershipMismatch,
                Some("Subscription does not belong to this account".into()),
            ),
            AppError::ProviderAuth(_) => error_resp(
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorCode::ProviderUnavailable,
                Some("Payment provider is unavailable. Please try again later.".into()),
            ),
            AppError::SubscriptionCreate(detail) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::SubscriptionCreateFailed,
                Some(format!(
                    "Failed to create subscription: {}",
                    provider_detail(&detail)
                )),
            ),
            AppError::Provider(_) => {
                error_resp(StatusCode::BAD_GATEWAY, ErrorCode::ProviderError, None)
            }
            AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, None)
            }
        }
    }
}

/// Provider detail is PayPal's one-line `message`, never the raw body.
/// Control characters are dropped and the length is capped.
fn provider_detail(detail: &str) -> String {
    const MAX_DETAIL_CHARS: usize = 200;
    detail
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_DETAIL_CHARS)
        .collect()
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    (status, Json(ErrorResponse { code, message })).into_response()
}
