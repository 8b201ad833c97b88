use serde::Deserialize;

/// Subscription webhook events this service reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionEventKind {
    Activated,
    Updated,
    Cancelled,
    Suspended,
    Expired,
    /// A recurring payment landed; the resource is the sale.
    PaymentCompleted,
    Other,
}

impl SubscriptionEventKind {
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "BILLING.SUBSCRIPTION.ACTIVATED" => SubscriptionEventKind::Activated,
            "BILLING.SUBSCRIPTION.UPDATED" => SubscriptionEventKind::Updated,
            "BILLING.SUBSCRIPTION.CANCELLED" => SubscriptionEventKind::Cancelled,
            "BILLING.SUBSCRIPTION.SUSPENDED" => SubscriptionEventKind::Suspended,
            "BILLING.SUBSCRIPTION.EXPIRED" => SubscriptionEventKind::Expired,
            "PAYMENT.SALE.COMPLETED" => SubscriptionEventKind::PaymentCompleted,
            _ => SubscriptionEventKind::Other,
        }
    }
}

/// Envelope of a PayPal webhook notification. `resource` is kept raw.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource: serde_json::Value,
}

impl WebhookEvent {
    pub fn kind(&self) -> SubscriptionEventKind {
        SubscriptionEventKind::from_event_type(&self.event_type)
    }

    /// The id of the resource the event is about (the subscription id for billing events).
    pub fn resource_id(&self) -> Option<&str> {
        self.resource["id"].as_str()
    }

    /// The subscription the event concerns. Sale events point at it through
    /// `billing_agreement_id`.
    pub fn subscription_id(&self) -> Option<&str> {
        match self.kind() {
            SubscriptionEventKind::PaymentCompleted => {
                self.resource["billing_agreement_id"].as_str()
            }
            _ => self.resource_id(),
        }
    }
}
