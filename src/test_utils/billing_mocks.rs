//! In-memory mock implementations for billing-related repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::subscription_billing::{
        ActivateMembershipInput, ProfileRepo, SubscriptionRepo, WebhookEventRepo,
    },
    domain::entities::{
        membership::MembershipStatus, profile::Profile,
        subscription::{Subscription, SubscriptionStatus},
    },
};

// ============================================================================
// InMemoryBillingStore
// ============================================================================

#[derive(Default)]
struct StoreState {
    subscriptions: HashMap<String, Subscription>,
    profiles: HashMap<Uuid, Profile>,
}

/// Subscriptions and profiles behind one lock, so `activate_membership` is
/// all-or-nothing the same way the Postgres transaction is.
#[derive(Default)]
pub struct InMemoryBillingStore {
    state: Mutex<StoreState>,
    fail_profile_write: AtomicBool,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_profile(&self, profile: Profile) {
        self.state
            .lock()
            .unwrap()
            .profiles
            .insert(profile.user_id, profile);
    }

    pub fn insert_subscription(&self, subscription: Subscription) {
        self.state
            .lock()
            .unwrap()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Make the profile half of activations and renewals fail after the
    /// subscription half has been written; the store then undoes that write.
    pub fn fail_profile_writes(&self, fail: bool) {
        self.fail_profile_write.store(fail, Ordering::SeqCst);
    }

    pub fn subscription(&self, id: &str) -> Option<Subscription> {
        self.state.lock().unwrap().subscriptions.get(id).cloned()
    }

    pub fn profile(&self, user_id: Uuid) -> Option<Profile> {
        self.state.lock().unwrap().profiles.get(&user_id).cloned()
    }

    pub fn subscription_count(&self) -> usize {
        self.state.lock().unwrap().subscriptions.len()
    }
}

#[async_trait]
impl SubscriptionRepo for InMemoryBillingStore {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Subscription>> {
        Ok(self.subscription(id))
    }

    async fn activate_membership(&self, input: &ActivateMembershipInput) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        if state.subscriptions.contains_key(&input.subscription.id) {
            return Ok(false);
        }

        let now = chrono::Utc::now();
        let mut subscription = input.subscription.clone();
        subscription.created_at = Some(now);
        subscription.updated_at = Some(now);
        state
            .subscriptions
            .insert(subscription.id.clone(), subscription);

        if self.fail_profile_write.load(Ordering::SeqCst) {
            // Rollback
            state.subscriptions.remove(&input.subscription.id);
            return Err(AppError::Database("profile update failed".into()));
        }

        let user_id = input.subscription.user_id;
        let profile = state.profiles.entry(user_id).or_insert_with(|| Profile {
            user_id,
            email: None,
            membership_status: MembershipStatus::Free,
            membership_plan: None,
            membership_expires: None,
            updated_at: None,
        });
        profile.membership_status = MembershipStatus::Pro;
        profile.membership_plan = Some(input.membership_plan.clone());
        profile.membership_expires = Some(input.membership_expires);
        profile.updated_at = Some(now);
        Ok(true)
    }

    async fn update_status(&self, id: &str, status: SubscriptionStatus) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        match state.subscriptions.get_mut(id) {
            Some(sub) => {
                sub.status = status;
                sub.updated_at = Some(chrono::Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn extend_membership(&self, id: &str, period_end: DateTime<Utc>) -> AppResult<bool> {
        let mut state = self.state.lock().unwrap();
        let Some(sub) = state.subscriptions.get_mut(id) else {
            return Ok(false);
        };
        if sub.current_period_end.is_some_and(|end| end >= period_end) {
            return Ok(false);
        }

        let previous = (sub.current_period_end, sub.updated_at);
        let user_id = sub.user_id;
        sub.current_period_end = Some(period_end);
        sub.updated_at = Some(Utc::now());

        if self.fail_profile_write.load(Ordering::SeqCst) {
            // Rollback
            if let Some(sub) = state.subscriptions.get_mut(id) {
                (sub.current_period_end, sub.updated_at) = previous;
            }
            return Err(AppError::Database("profile update failed".into()));
        }

        if let Some(profile) = state.profiles.get_mut(&user_id) {
            profile.membership_status = MembershipStatus::Pro;
            profile.membership_expires = Some(
                profile
                    .membership_expires
                    .map_or(period_end, |e| e.max(period_end)),
            );
            profile.updated_at = Some(Utc::now());
        }
        Ok(true)
    }
}

#[async_trait]
impl ProfileRepo for InMemoryBillingStore {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.profile(user_id))
    }
}

// ============================================================================
// InMemoryWebhookEventRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryWebhookEventRepo {
    pub events: Mutex<HashMap<String, (String, Option<String>)>>,
}

impl InMemoryWebhookEventRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl WebhookEventRepo for InMemoryWebhookEventRepo {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool> {
        Ok(self.events.lock().unwrap().contains_key(event_id))
    }

    async fn mark_processed(
        &self,
        event_id: &str,
        event_type: &str,
        resource_id: Option<&str>,
    ) -> AppResult<()> {
        self.events.lock().unwrap().insert(
            event_id.to_string(),
            (event_type.to_string(), resource_id.map(str::to_string)),
        );
        Ok(())
    }
}
