use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider-side subscription lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    ApprovalPending,
    Approved,
    Active,
    Suspended,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::ApprovalPending => "APPROVAL_PENDING",
            SubscriptionStatus::Approved => "APPROVED",
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Suspended => "SUSPENDED",
            SubscriptionStatus::Cancelled => "CANCELLED",
            SubscriptionStatus::Expired => "EXPIRED",
        }
    }

    /// Convert from a PayPal subscription status string
    pub fn from_paypal(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "APPROVAL_PENDING" => SubscriptionStatus::ApprovalPending,
            "APPROVED" => SubscriptionStatus::Approved,
            "ACTIVE" => SubscriptionStatus::Active,
            "SUSPENDED" => SubscriptionStatus::Suspended,
            "CANCELLED" | "CANCELED" => SubscriptionStatus::Cancelled,
            "EXPIRED" => SubscriptionStatus::Expired,
            // Never grant access on an unknown state
            _ => SubscriptionStatus::ApprovalPending,
        }
    }

    /// Returns true if the remote state allows flipping the user to Pro.
    pub fn is_activatable(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Approved)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local mirror of a provider subscription. `id` is the provider's id.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: String,
    pub user_id: Uuid,
    pub status: SubscriptionStatus,
    pub plan_id: String,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub is_trial: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paypal() {
        assert_eq!(SubscriptionStatus::from_paypal("ACTIVE"), SubscriptionStatus::Active);
        assert_eq!(SubscriptionStatus::from_paypal("active"), SubscriptionStatus::Active);
        assert_eq!(SubscriptionStatus::from_paypal("CANCELED"), SubscriptionStatus::Cancelled);
        assert_eq!(
            SubscriptionStatus::from_paypal("SOMETHING_NEW"),
            SubscriptionStatus::ApprovalPending
        );
    }

    #[test]
    fn test_is_activatable() {
        assert!(SubscriptionStatus::Active.is_activatable());
        assert!(SubscriptionStatus::Approved.is_activatable());
        assert!(!SubscriptionStatus::ApprovalPending.is_activatable());
        assert!(!SubscriptionStatus::Suspended.is_activatable());
        assert!(!SubscriptionStatus::Cancelled.is_activatable());
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&SubscriptionStatus::ApprovalPending).unwrap();
        assert_eq!(json, r#""APPROVAL_PENDING""#);
    }
}
