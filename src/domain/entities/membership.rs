use serde::{Deserialize, Serialize};

/// Plan code written to a profile when a Pro subscription is activated.
pub const PRO_MONTHLY_PLAN: &str = "pro-monthly";

/// Days of Pro access granted when the provider does not report a next billing time.
pub const FALLBACK_MEMBERSHIP_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    #[default]
    Free,
    Demo,
    Pro,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Free => "free",
            MembershipStatus::Demo => "demo",
            MembershipStatus::Pro => "pro",
        }
    }
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
