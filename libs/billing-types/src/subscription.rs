use serde::{Deserialize, Serialize};

/// Body of `POST /subscriptions`. Both fields fall back to the session's claims.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionResponse {
    pub subscription_id: String,
    /// Provider page the browser must be redirected to.
    pub approval_url: String,
    pub status: String,
}

/// Provider status passthrough for `GET /subscriptions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub id: String,
    pub status: String,
    pub plan_id: Option<String>,
    /// RFC 3339 timestamp
    pub next_billing_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckActivateRequest {
    pub subscription_id: String,
}

/// Result of `POST /subscriptions/check-activate`.
///
/// - activated now: `{success: true, activated: true, message}`
/// - already active: `{success: true, activated: false, message}`
/// - not active yet: `{success: false, status, message}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckActivateResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub message: String,
}

impl CheckActivateResponse {
    pub fn activated(message: impl Into<String>) -> Self {
        Self {
            success: true,
            activated: Some(true),
            status: None,
            message: message.into(),
        }
    }

    pub fn already_activated(message: impl Into<String>) -> Self {
        Self {
            success: true,
            activated: Some(false),
            status: None,
            message: message.into(),
        }
    }

    pub fn not_active_yet(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            activated: None,
            status: Some(status.into()),
            message: message.into(),
        }
    }

    /// True once the membership is confirmed, either by this call or an earlier one.
    pub fn is_confirmed(&self) -> bool {
        if self.success {
            return true;
        }
        self.status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("active") || s.eq_ignore_ascii_case("authenticated"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelSubscriptionRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSubscriptionResponse {
    pub success: bool,
    pub message: String,
}
