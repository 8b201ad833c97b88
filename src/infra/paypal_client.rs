use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::subscription_provider::{
        CreatedSubscription, Money, PlanDefinition, RemotePlan, RemoteSubscription, Subscriber,
        SubscriptionId, SubscriptionProviderPort, WebhookHeaders,
    },
    domain::entities::subscription::SubscriptionStatus,
    infra::{config::PayPalConfig, error::InfraError, http_client::try_build_client},
};

const PLAN_PAGE_SIZE: u32 = 20;

#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    config: PayPalConfig,
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Result<Self, InfraError> {
        let client = try_build_client().map_err(InfraError::HttpClient)?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base.as_str().trim_end_matches('/'), path)
    }

    /// `/v1/billing/subscriptions/{id}[/{action}]` with the id encoded as one path segment.
    fn subscription_url(&self, id: &SubscriptionId, action: Option<&str>) -> AppResult<Url> {
        let mut url = self.config.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("PayPal API base is not a hierarchical URL".into()))?
            .pop_if_empty()
            .extend(["v1", "billing", "subscriptions", id.as_str()])
            .extend(action);
        Ok(url)
    }

    fn basic_auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id,
            self.config.client_secret.expose_secret()
        ));
        format!("Basic {}", encoded)
    }

    // ========================================================================
    // OAuth
    // ========================================================================

    /// Client-credentials token. Fetched per operation, never cached.
    async fn access_token(&self) -> AppResult<String> {
        let response = self
            .client
            .post(self.url("/v1/oauth2/token"))
            .header("Authorization", self.basic_auth_header())
            .header("Accept", "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AppError::ProviderAuth(format!("PayPal token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "PayPal token exchange failed");
            return Err(AppError::ProviderAuth(format!("token endpoint returned {}", status)));
        }

        let token: PayPalTokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::ProviderAuth(format!("Malformed PayPal token response: {}", e)))?;
        Ok(token.access_token)
    }

    async fn authorized(&self, request: RequestBuilder) -> AppResult<reqwest::Response> {
        let token = self.access_token().await?;
        request
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("PayPal request failed: {}", e)))
    }

    // ========================================================================
    // Plans
    // ========================================================================

    async fn list_plans_page(&self, page: u32) -> AppResult<PayPalPlanList> {
        let request = self.client.get(self.url("/v1/billing/plans")).query(&[
            ("page_size", PLAN_PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("total_required", "true".to_string()),
        ]);
        let response = self.authorized(request).await?;
        self.handle_response(response).await
    }

    // ========================================================================
    // Response Handling
    // ========================================================================

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Provider(format!("Failed to read PayPal response: {}", e)))?;

        if !status.is_success() {
            error!(status = %status, body = %body, "PayPal API error");
            return Err(error_for_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(body = %body, error = %e, "Failed to parse PayPal response");
            AppError::Provider(format!("Failed to parse PayPal response: {}", e))
        })
    }
}

fn error_for_status(status: StatusCode, body: &str) -> AppError {
    let parsed = serde_json::from_str::<PayPalErrorResponse>(body).ok();
    let not_found = status == StatusCode::NOT_FOUND
        || parsed
            .as_ref()
            .is_some_and(|e| e.name.as_deref() == Some("RESOURCE_NOT_FOUND"));
    if not_found {
        return AppError::NotFound;
    }

    let detail = parsed
        .and_then(|e| e.message.or(e.name))
        .unwrap_or_else(|| status.to_string());
    AppError::Provider(format!("PayPal error: {}", detail))
}

#[async_trait]
impl SubscriptionProviderPort for PayPalClient {
    #[instrument(skip(self, definition), fields(product = %definition.product_name))]
    async fn create_product(&self, definition: &PlanDefinition) -> AppResult<String> {
        let request = self
            .client
            .post(self.url("/v1/catalogs/products"))
            .json(&json!({
                "name": definition.product_name,
                "description": definition.product_description,
                "type": "SERVICE",
                "category": "SOFTWARE",
            }));
        let response = self.authorized(request).await?;
        let product: PayPalProduct = self.handle_response(response).await?;
        info!(product_id = %product.id, "Created PayPal product");
        Ok(product.id)
    }

    #[instrument(skip(self, definition), fields(plan = %definition.plan_name))]
    async fn create_plan(
        &self,
        product_id: &str,
        definition: &PlanDefinition,
    ) -> AppResult<RemotePlan> {
        let request = self
            .client
            .post(self.url("/v1/billing/plans"))
            .json(&json!({
                "product_id": product_id,
                "name": definition.plan_name,
                "description": definition.product_description,
                "status": "ACTIVE",
                "billing_cycles": [{
                    "frequency": {"interval_unit": "MONTH", "interval_count": 1},
                    "tenure_type": "REGULAR",
                    "sequence": 1,
                    "total_cycles": 0,
                    "pricing_scheme": {
                        "fixed_price": {"value": definition.price, "currency_code": definition.currency}
                    }
                }],
                "payment_preferences": {
                    "auto_bill_outstanding": true,
                    "setup_fee_failure_action": "CONTINUE",
                    "payment_failure_threshold": 3
                }
            }));
        let response = self.authorized(request).await?;
        let plan: PayPalPlan = self.handle_response(response).await?;
        Ok(plan.into())
    }

    async fn list_plans(&self) -> AppResult<Vec<RemotePlan>> {
        let mut plans = Vec::new();
        let mut page = 1;
        loop {
            let list = self.list_plans_page(page).await?;
            plans.extend(list.plans.into_iter().map(RemotePlan::from));
            let total_pages = list.total_pages.unwrap_or(1);
            if page >= total_pages {
                break;
            }
            page += 1;
        }
        debug!(count = plans.len(), "Listed PayPal plans");
        Ok(plans)
    }

    #[instrument(skip(self, subscriber), fields(user_id = %subscriber.user_id))]
    async fn create_subscription(
        &self,
        plan_id: &str,
        subscriber: &Subscriber,
    ) -> AppResult<CreatedSubscription> {
        let (given_name, surname) = subscriber.name_parts();
        let request = self
            .client
            .post(self.url("/v1/billing/subscriptions"))
            .json(&json!({
                "plan_id": plan_id,
                "custom_id": subscriber.user_id.to_string(),
                "subscriber": {
                    "name": {"given_name": given_name, "surname": surname},
                    "email_address": subscriber.email,
                },
                "application_context": {
                    "brand_name": self.config.brand_name,
                    "user_action": "SUBSCRIBE_NOW",
                    "shipping_preference": "NO_SHIPPING",
                    "return_url": self.config.return_url.as_str(),
                    "cancel_url": self.config.cancel_url.as_str(),
                }
            }));

        let response = self.authorized(request).await?;
        let created: PayPalSubscription =
            self.handle_response(response).await.map_err(|e| match e {
                AppError::Provider(detail) => AppError::SubscriptionCreate(detail),
                other => other,
            })?;

        let approval_url = created
            .links
            .iter()
            .find(|l| l.rel == "approve")
            .map(|l| l.href.clone())
            .ok_or_else(|| {
                error!(subscription_id = %created.id, "PayPal response has no approve link");
                AppError::SubscriptionCreate("missing approval link".into())
            })?;

        Ok(CreatedSubscription {
            subscription_id: SubscriptionId::new(created.id),
            status: SubscriptionStatus::from_paypal(&created.status),
            approval_url,
        })
    }

    async fn get_subscription(&self, id: &SubscriptionId) -> AppResult<RemoteSubscription> {
        let request = self.client.get(self.subscription_url(id, None)?);
        let response = self.authorized(request).await?;
        let subscription: PayPalSubscription = self.handle_response(response).await?;
        Ok(subscription.into())
    }

    #[instrument(skip(self, reason))]
    async fn cancel_subscription(&self, id: &SubscriptionId, reason: &str) -> AppResult<()> {
        let request = self
            .client
            .post(self.subscription_url(id, Some("cancel"))?)
            .json(&json!({ "reason": reason }));
        let response = self.authorized(request).await?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, body = %body, "PayPal cancel failed");
        Err(error_for_status(status, &body))
    }

    async fn verify_webhook(&self, headers: &WebhookHeaders, body: &str) -> AppResult<bool> {
        let event: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

        let request = self
            .client
            .post(self.url("/v1/notifications/verify-webhook-signature"))
            .json(&json!({
                "auth_algo": headers.auth_algo,
                "cert_url": headers.cert_url,
                "transmission_id": headers.transmission_id,
                "transmission_sig": headers.transmission_sig,
                "transmission_time": headers.transmission_time,
                "webhook_id": self.config.webhook_id,
                "webhook_event": event,
            }));
        let response = self.authorized(request).await?;
        let verification: PayPalVerifyResponse = self.handle_response(response).await?;
        Ok(verification.verification_status == "SUCCESS")
    }
}

// ============================================================================
// PayPal Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct PayPalTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct PayPalErrorResponse {
    name: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PayPalProduct {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PayPalPlan {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    status: String,
}

impl From<PayPalPlan> for RemotePlan {
    fn from(p: PayPalPlan) -> Self {
        RemotePlan {
            id: p.id,
            name: p.name,
            status: p.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PayPalPlanList {
    #[serde(default)]
    plans: Vec<PayPalPlan>,
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PayPalLink {
    href: String,
    rel: String,
}

#[derive(Debug, Deserialize)]
struct PayPalMoney {
    currency_code: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct PayPalLastPayment {
    amount: PayPalMoney,
}

#[derive(Debug, Deserialize)]
struct PayPalCycleExecution {
    tenure_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct PayPalBillingInfo {
    next_billing_time: Option<DateTime<Utc>>,
    last_payment: Option<PayPalLastPayment>,
    #[serde(default)]
    cycle_executions: Vec<PayPalCycleExecution>,
}

#[derive(Debug, Deserialize)]
struct PayPalSubscription {
    id: String,
    status: String,
    plan_id: Option<String>,
    custom_id: Option<String>,
    start_time: Option<DateTime<Utc>>,
    billing_info: Option<PayPalBillingInfo>,
    #[serde(default)]
    links: Vec<PayPalLink>,
}

impl From<PayPalSubscription> for RemoteSubscription {
    fn from(s: PayPalSubscription) -> Self {
        let billing = s.billing_info.unwrap_or_default();
        let last_payment = billing.last_payment.and_then(|p| {
            parse_cents(&p.amount.value).map(|amount_cents| Money {
                amount_cents,
                currency: p.amount.currency_code,
            })
        });
        let is_trial = billing
            .cycle_executions
            .first()
            .is_some_and(|c| c.tenure_type == "TRIAL");

        RemoteSubscription {
            id: SubscriptionId::new(s.id),
            status: SubscriptionStatus::from_paypal(&s.status),
            plan_id: s.plan_id,
            custom_id: s.custom_id,
            start_time: s.start_time,
            next_billing_time: billing.next_billing_time,
            last_payment,
            is_trial,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PayPalVerifyResponse {
    verification_status: String,
}

/// "9.99" -> 999, "-1.50" -> -150. Fractions beyond two digits are truncated.
fn parse_cents(value: &str) -> Option<i64> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if whole.is_empty() || !is_digits(whole) || !is_digits(fraction) {
        return None;
    }

    let whole: i64 = whole.parse().ok()?;
    let mut fraction: String = fraction.chars().take(2).collect();
    while fraction.len() < 2 {
        fraction.push('0');
    }
    let fraction: i64 = fraction.parse().ok()?;
    let cents = whole.checked_mul(100)?.checked_add(fraction)?;
    Some(if negative { -cents } else { cents })
}
