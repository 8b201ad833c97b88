use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use billing_types::{
    CancelSubscriptionRequest, CancelSubscriptionResponse, CheckActivateRequest,
    CreateSubscriptionRequest, CreateSubscriptionResponse, SubscriptionStatusResponse,
};
use serde_json::json;
use tracing::error;

use crate::{
    adapters::http::{app_state::AppState, session::current_user},
    app_error::{AppError, AppResult},
    application::ports::subscription_provider::WebhookHeaders,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_subscription))
        .route("/check-activate", post(check_activate))
        .route("/webhook", post(webhook))
        .route("/{id}", get(get_subscription))
        .route("/{id}/cancel", post(cancel_subscription))
}

async fn create_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> AppResult<impl IntoResponse> {
    let session = current_user(&headers, &cookies, &app_state)?;
    let email = payload
        .email
        .or(session.email)
        .ok_or_else(|| AppError::InvalidInput("email is required".into()))?;
    let name = payload.name.unwrap_or_default();

    let created = app_state
        .billing_use_cases
        .create_subscription(session.user_id, &email, &name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSubscriptionResponse {
            subscription_id: created.subscription_id.to_string(),
            approval_url: created.approval_url,
            status: created.status.as_str().to_string(),
        }),
    ))
}

async fn get_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let session = current_user(&headers, &cookies, &app_state)?;
    let remote = app_state
        .billing_use_cases
        .get_subscription(session.user_id, &id)
        .await?;

    Ok(Json(SubscriptionStatusResponse {
        id: remote.id.to_string(),
        status: remote.status.as_str().to_string(),
        plan_id: remote.plan_id,
        next_billing_time: remote.next_billing_time.map(|t| t.to_rfc3339()),
    }))
}

async fn check_activate(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Json(payload): Json<CheckActivateRequest>,
) -> AppResult<impl IntoResponse> {
    let session = current_user(&headers, &cookies, &app_state)?;
    let outcome = app_state
        .billing_use_cases
        .check_and_activate(session.user_id, &payload.subscription_id)
        .await?;
    Ok(Json(outcome.to_check_response()))
}

async fn cancel_subscription(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
    Path(id): Path<String>,
    Json(payload): Json<CancelSubscriptionRequest>,
) -> AppResult<impl IntoResponse> {
    let session = current_user(&headers, &cookies, &app_state)?;
    app_state
        .billing_use_cases
        .cancel_subscription(session.user_id, &id, payload.reason.as_deref())
        .await?;

    Ok(Json(CancelSubscriptionResponse {
        success: true,
        message: "Subscription cancelled. Pro access remains until the end of the billing period."
            .to_string(),
    }))
}

/// PayPal delivery endpoint. No session; authenticity comes from the
/// provider-side signature check.
async fn webhook(State(app_state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    let webhook_headers = match webhook_headers(&headers) {
        Ok(h) => h,
        Err(e) => return e.into_response(),
    };

    match app_state
        .billing_use_cases
        .handle_webhook(&webhook_headers, &body)
        .await
    {
        Ok(disposition) => {
            tracing::info!(?disposition, transmission_id = %webhook_headers.transmission_id, "Webhook handled");
            (StatusCode::OK, Json(json!({ "received": true }))).into_response()
        }
        Err(e) if e.is_retryable() => {
            error!(
                error = %e,
                transmission_id = %webhook_headers.transmission_id,
                retryable = true,
                "Webhook processing failed, returning 500 for redelivery"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => e.into_response(),
    }
}

fn webhook_headers(headers: &HeaderMap) -> AppResult<WebhookHeaders> {
    let get = |name: &str| -> AppResult<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::InvalidInput(format!("Missing {} header", name)))
    };

    Ok(WebhookHeaders {
        auth_algo: get("paypal-auth-algo")?,
        cert_url: get("paypal-cert-url")?,
        transmission_id: get("paypal-transmission-id")?,
        transmission_sig: get("paypal-transmission-sig")?,
        transmission_time: get("paypal-transmission-time")?,
    })
}
