use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::subscription::SubscriptionStatus,
};

// ============================================================================
// Port Types - Provider-agnostic domain types
// ============================================================================

/// Unique identifier for a subscription in the payment provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Validate an id received from a client or a webhook.
    ///
    /// PayPal ids look like `I-BW452GLLEP1G`; anything outside `[A-Za-z0-9_-]`
    /// is rejected before it reaches a provider URL.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let id = raw.trim();
        if id.is_empty() {
            return Err(AppError::InvalidInput("subscriptionId is required".into()));
        }
        let valid = id.len() <= 64
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid {
            return Err(AppError::InvalidInput("Invalid subscriptionId".into()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the recurring Pro plan looks like on the provider side.
#[derive(Debug, Clone)]
pub struct PlanDefinition {
    pub product_name: String,
    pub product_description: String,
    pub plan_name: String,
    /// Decimal price as the provider expects it, e.g. "9.99"
    pub price: String,
    pub currency: String,
}

/// A billing plan as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePlan {
    pub id: String,
    pub name: String,
    pub status: String,
}

impl RemotePlan {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }
}

/// Person the subscription is created for.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

impl Subscriber {
    /// Split the display name into (given name, surname).
    pub fn name_parts(&self) -> (String, String) {
        let trimmed = self.name.trim();
        match trimmed.split_once(char::is_whitespace) {
            Some((given, surname)) => (given.to_string(), surname.trim().to_string()),
            None => (trimmed.to_string(), String::new()),
        }
    }
}

/// Result of creating a subscription: the browser must visit `approval_url`.
#[derive(Debug, Clone)]
pub struct CreatedSubscription {
    pub subscription_id: SubscriptionId,
    pub status: SubscriptionStatus,
    pub approval_url: String,
}

/// Money amount in minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    pub amount_cents: i64,
    pub currency: String,
}

/// Subscription state as reported by the provider.
#[derive(Debug, Clone)]
pub struct RemoteSubscription {
    pub id: SubscriptionId,
    pub status: SubscriptionStatus,
    pub plan_id: Option<String>,
    /// Owner passthrough set at creation time.
    pub custom_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub next_billing_time: Option<DateTime<Utc>>,
    pub last_payment: Option<Money>,
    pub is_trial: bool,
}

impl RemoteSubscription {
    /// True only when the passthrough owner id equals `user_id`.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id() == Some(user_id)
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.custom_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
    }
}

/// Transmission headers sent with a provider webhook delivery.
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    pub auth_algo: String,
    pub cert_url: String,
    pub transmission_id: String,
    pub transmission_sig: String,
    pub transmission_time: String,
}

// ============================================================================
// Subscription Provider Port
// ============================================================================

/// Recurring-billing operations the reconciliation core needs from a payment provider.
#[async_trait]
pub trait SubscriptionProviderPort: Send + Sync {
    /// Create a catalog product. Not idempotent.
    async fn create_product(&self, definition: &PlanDefinition) -> AppResult<String>;

    /// Create a monthly plan for `product_id`. Not idempotent.
    async fn create_plan(
        &self,
        product_id: &str,
        definition: &PlanDefinition,
    ) -> AppResult<RemotePlan>;

    /// List all billing plans visible to the credentials.
    async fn list_plans(&self) -> AppResult<Vec<RemotePlan>>;

    /// Create a subscription on `plan_id` with `subscriber.user_id` as owner passthrough.
    async fn create_subscription(
        &self,
        plan_id: &str,
        subscriber: &Subscriber,
    ) -> AppResult<CreatedSubscription>;

    /// Read-only status fetch. Unknown ids yield `AppError::NotFound`.
    async fn get_subscription(&self, id: &SubscriptionId) -> AppResult<RemoteSubscription>;

    async fn cancel_subscription(&self, id: &SubscriptionId, reason: &str) -> AppResult<()>;

    /// Ask the provider whether a webhook delivery is authentic.
    async fn verify_webhook(&self, headers: &WebhookHeaders, body: &str) -> AppResult<bool>;
}
