//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    membership::MembershipStatus,
    profile::Profile,
    subscription::{Subscription, SubscriptionStatus},
};

/// Create a free-tier profile with sensible defaults.
pub fn create_test_profile(user_id: Uuid, overrides: impl FnOnce(&mut Profile)) -> Profile {
    let mut profile = Profile {
        user_id,
        email: Some("u1@x.com".to_string()),
        membership_status: MembershipStatus::Free,
        membership_plan: None,
        membership_expires: None,
        updated_at: Some(test_datetime()),
    };
    overrides(&mut profile);
    profile
}

/// Create an active local subscription row with sensible defaults.
pub fn create_test_subscription(
    id: &str,
    user_id: Uuid,
    overrides: impl FnOnce(&mut Subscription),
) -> Subscription {
    let mut subscription = Subscription {
        id: id.to_string(),
        user_id,
        status: SubscriptionStatus::Active,
        plan_id: "P-TEST".to_string(),
        current_period_start: Some(test_datetime()),
        current_period_end: None,
        amount_cents: Some(999),
        currency: Some("USD".to_string()),
        is_trial: false,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut subscription);
    subscription
}

pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}
