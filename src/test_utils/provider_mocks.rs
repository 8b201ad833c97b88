//! Scriptable in-memory stand-in for the payment provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::subscription_provider::{
        CreatedSubscription, PlanDefinition, RemotePlan, RemoteSubscription, Subscriber,
        SubscriptionId, SubscriptionProviderPort, WebhookHeaders,
    },
    domain::entities::subscription::SubscriptionStatus,
};

pub fn test_plan_definition() -> PlanDefinition {
    PlanDefinition {
        product_name: "BookingGen Pro".to_string(),
        product_description: "Unlimited booking page generation".to_string(),
        plan_name: "BookingGen Pro Monthly".to_string(),
        price: "9.99".to_string(),
        currency: "USD".to_string(),
    }
}

/// Plans and subscriptions live in memory; every call is counted.
pub struct FakeSubscriptionProvider {
    plans: Mutex<Vec<RemotePlan>>,
    subscriptions: Mutex<HashMap<String, RemoteSubscription>>,
    cancel_reasons: Mutex<Vec<(String, String)>>,
    get_failure: Mutex<Option<String>>,
    webhook_valid: AtomicBool,
    next_id: AtomicUsize,
    plan_list_calls: AtomicUsize,
    products_created: AtomicUsize,
    plans_created: AtomicUsize,
    subscriptions_created: AtomicUsize,
    get_calls: AtomicUsize,
}

impl Default for FakeSubscriptionProvider {
    fn default() -> Self {
        Self {
            plans: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(HashMap::new()),
            cancel_reasons: Mutex::new(Vec::new()),
            get_failure: Mutex::new(None),
            webhook_valid: AtomicBool::new(true),
            next_id: AtomicUsize::new(1),
            plan_list_calls: AtomicUsize::new(0),
            products_created: AtomicUsize::new(0),
            plans_created: AtomicUsize::new(0),
            subscriptions_created: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeSubscriptionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_plan(&self, id: &str, name: &str, status: &str) {
        self.plans.lock().unwrap().push(RemotePlan {
            id: id.to_string(),
            name: name.to_string(),
            status: status.to_string(),
        });
    }

    /// Simulate plans deleted on the provider side.
    pub fn drop_plans(&self) {
        self.plans.lock().unwrap().clear();
    }

    pub fn insert_subscription(&self, subscription: RemoteSubscription) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id.as_str().to_string(), subscription);
    }

    pub fn set_status(&self, id: &str, status: SubscriptionStatus) {
        if let Some(sub) = self.subscriptions.lock().unwrap().get_mut(id) {
            sub.status = status;
        }
    }

    /// Simulate a renewal: the provider moves the next billing date.
    pub fn set_next_billing_time(&self, id: &str, next: DateTime<Utc>) {
        if let Some(sub) = self.subscriptions.lock().unwrap().get_mut(id) {
            sub.next_billing_time = Some(next);
        }
    }

    pub fn subscription(&self, id: &str) -> Option<RemoteSubscription> {
        self.subscriptions.lock().unwrap().get(id).cloned()
    }

    /// Make every `get_subscription` fail with a provider error.
    pub fn fail_gets(&self, message: &str) {
        *self.get_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_failures(&self) {
        self.get_failure.lock().unwrap().take();
    }

    pub fn set_webhook_valid(&self, valid: bool) {
        self.webhook_valid.store(valid, Ordering::SeqCst);
    }

    pub fn cancel_reasons(&self) -> Vec<(String, String)> {
        self.cancel_reasons.lock().unwrap().clone()
    }

    pub fn plan_list_calls(&self) -> usize {
        self.plan_list_calls.load(Ordering::SeqCst)
    }

    pub fn products_created(&self) -> usize {
        self.products_created.load(Ordering::SeqCst)
    }

    pub fn plans_created(&self) -> usize {
        self.plans_created.load(Ordering::SeqCst)
    }

    pub fn subscriptions_created(&self) -> usize {
        self.subscriptions_created.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionProviderPort for FakeSubscriptionProvider {
    async fn create_product(&self, _definition: &PlanDefinition) -> AppResult<String> {
        self.products_created.fetch_add(1, Ordering::SeqCst);
        Ok(format!("PROD-{}", self.next_id()))
    }

    async fn create_plan(
        &self,
        _product_id: &str,
        definition: &PlanDefinition,
    ) -> AppResult<RemotePlan> {
        self.plans_created.fetch_add(1, Ordering::SeqCst);
        let plan = RemotePlan {
            id: format!("P-{}", self.next_id()),
            name: definition.plan_name.clone(),
            status: "ACTIVE".to_string(),
        };
        self.plans.lock().unwrap().push(plan.clone());
        Ok(plan)
    }

    async fn list_plans(&self) -> AppResult<Vec<RemotePlan>> {
        self.plan_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.plans.lock().unwrap().clone())
    }

    async fn create_subscription(
        &self,
        plan_id: &str,
        subscriber: &Subscriber,
    ) -> AppResult<CreatedSubscription> {
        if !self.plans.lock().unwrap().iter().any(|p| p.id == plan_id) {
            return Err(AppError::NotFound);
        }
        self.subscriptions_created.fetch_add(1, Ordering::SeqCst);

        let n = self.next_id();
        let id = SubscriptionId::new(format!("I-FAKE{:04}", n));
        self.insert_subscription(RemoteSubscription {
            id: id.clone(),
            status: SubscriptionStatus::ApprovalPending,
            plan_id: Some(plan_id.to_string()),
            custom_id: Some(subscriber.user_id.to_string()),
            start_time: None,
            next_billing_time: None,
            last_payment: None,
            is_trial: false,
        });

        Ok(CreatedSubscription {
            subscription_id: id,
            status: SubscriptionStatus::ApprovalPending,
            approval_url: format!(
                "https://www.sandbox.paypal.com/webapps/billing/subscriptions?ba_token=BA-{}",
                n
            ),
        })
    }

    async fn get_subscription(&self, id: &SubscriptionId) -> AppResult<RemoteSubscription> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.get_failure.lock().unwrap().clone() {
            return Err(AppError::Provider(msg));
        }
        self.subscription(id.as_str()).ok_or(AppError::NotFound)
    }

    async fn cancel_subscription(&self, id: &SubscriptionId, reason: &str) -> AppResult<()> {
        let mut subs = self.subscriptions.lock().unwrap();
        let sub = subs.get_mut(id.as_str()).ok_or(AppError::NotFound)?;
        sub.status = SubscriptionStatus::Cancelled;
        self.cancel_reasons
            .lock()
            .unwrap()
            .push((id.as_str().to_string(), reason.to_string()));
        Ok(())
    }

    async fn verify_webhook(&self, _headers: &WebhookHeaders, _body: &str) -> AppResult<bool> {
        Ok(self.webhook_valid.load(Ordering::SeqCst))
    }
}

/// Remote subscription owned by `owner` in the given state.
pub fn remote_subscription(id: &str, owner: Uuid, status: SubscriptionStatus) -> RemoteSubscription {
    RemoteSubscription {
        id: SubscriptionId::new(id),
        status,
        plan_id: Some("P-TEST".to_string()),
        custom_id: Some(owner.to_string()),
        start_time: None,
        next_billing_time: None,
        last_payment: None,
        is_trial: false,
    }
}
