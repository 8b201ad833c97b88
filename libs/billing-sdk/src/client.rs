//! HTTP client for the billing API.

use std::time::Duration;

use billing_types::{
    CancelSubscriptionRequest, CancelSubscriptionResponse, CheckActivateRequest,
    CheckActivateResponse, CreateSubscriptionRequest, CreateSubscriptionResponse, ErrorResponse,
    ProfileResponse, SubscriptionStatusResponse,
};
use serde::de::DeserializeOwned;

use crate::error::BillingSdkError;
use crate::poller::ActivationCheck;

/// Configuration for the billing client.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// API root including the `/api` prefix (e.g., "https://bookinggen.app/api")
    pub base_url: String,

    /// Session token sent as `Authorization: Bearer`
    pub access_token: String,
}

/// Typed client for the subscription endpoints.
#[derive(Debug, Clone)]
pub struct BillingClient {
    config: BillingConfig,
    http_client: reqwest::Client,
}

impl BillingClient {
    /// Create a new billing client.
    ///
    /// Fails when the base URL or token is empty.
    pub fn new(config: BillingConfig) -> Result<Self, BillingSdkError> {
        if config.base_url.trim().is_empty() {
            return Err(BillingSdkError::Config("base_url is required".into()));
        }
        if config.access_token.is_empty() {
            return Err(BillingSdkError::Config("access_token is required".into()));
        }

        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Start a subscription. Redirect the browser to `approval_url` afterwards.
    pub async fn create_subscription(
        &self,
        request: &CreateSubscriptionRequest,
    ) -> Result<CreateSubscriptionResponse, BillingSdkError> {
        let response = self
            .http_client
            .post(self.url("/subscriptions"))
            .bearer_auth(&self.config.access_token)
            .json(request)
            .send()
            .await?;
        handle_response(response).await
    }

    pub async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionStatusResponse, BillingSdkError> {
        let response = self
            .http_client
            .get(self.url(&format!("/subscriptions/{}", subscription_id)))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        handle_response(response).await
    }

    /// Ask the API to activate the subscription if PayPal reports it live.
    ///
    /// `success: false` with a `status` means "not yet", not an error.
    pub async fn check_and_activate(
        &self,
        subscription_id: &str,
    ) -> Result<CheckActivateResponse, BillingSdkError> {
        let response = self
            .http_client
            .post(self.url("/subscriptions/check-activate"))
            .bearer_auth(&self.config.access_token)
            .json(&CheckActivateRequest {
                subscription_id: subscription_id.to_string(),
            })
            .send()
            .await?;
        handle_response(response).await
    }

    pub async fn cancel_subscription(
        &self,
        subscription_id: &str,
        reason: Option<&str>,
    ) -> Result<CancelSubscriptionResponse, BillingSdkError> {
        let response = self
            .http_client
            .post(self.url(&format!("/subscriptions/{}/cancel", subscription_id)))
            .bearer_auth(&self.config.access_token)
            .json(&CancelSubscriptionRequest {
                reason: reason.map(str::to_string),
            })
            .send()
            .await?;
        handle_response(response).await
    }

    pub async fn get_profile(&self) -> Result<ProfileResponse, BillingSdkError> {
        let response = self
            .http_client
            .get(self.url("/profile"))
            .bearer_auth(&self.config.access_token)
            .send()
            .await?;
        handle_response(response).await
    }
}

impl ActivationCheck for BillingClient {
    async fn check(&self, subscription_id: &str) -> Result<CheckActivateResponse, BillingSdkError> {
        self.check_and_activate(subscription_id).await
    }
}

async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, BillingSdkError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ErrorResponse>(&body).ok();
    Err(BillingSdkError::Api {
        status: status.as_u16(),
        code: parsed.as_ref().map(|e| e.code),
        message: parsed
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("Request failed with status {}", status)),
    })
}
