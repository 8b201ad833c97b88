use serde::{Deserialize, Serialize};

/// Billing-relevant view of a user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user_id: String,
    /// `free`, `demo` or `pro`
    pub membership_status: String,
    pub membership_plan: Option<String>,
    /// RFC 3339 timestamp
    pub membership_expires: Option<String>,
}
