use std::sync::Arc;

use async_trait::async_trait;
use billing_types::CheckActivateResponse;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::subscription_provider::{
            CreatedSubscription, RemoteSubscription, Subscriber, SubscriptionId,
            SubscriptionProviderPort, WebhookHeaders,
        },
        use_cases::plan_provisioner::PlanProvisioner,
    },
    domain::entities::{
        membership::{FALLBACK_MEMBERSHIP_DAYS, MembershipStatus, PRO_MONTHLY_PLAN},
        profile::Profile,
        subscription::{Subscription, SubscriptionStatus},
        webhook_event::{SubscriptionEventKind, WebhookEvent},
    },
};

const DEFAULT_CANCEL_REASON: &str = "Cancelled by user";

// ============================================================================
// Repository Ports
// ============================================================================

/// Everything written when a subscription flips its owner to Pro.
#[derive(Debug, Clone)]
pub struct ActivateMembershipInput {
    pub subscription: Subscription,
    pub membership_plan: String,
    pub membership_expires: DateTime<Utc>,
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_by_id(&self, id: &str) -> AppResult<Option<Subscription>>;

    /// Insert the subscription row and set the owner's profile to Pro as one
    /// unit. Returns `false` (and writes nothing) when a row with this id
    /// already exists.
    async fn activate_membership(&self, input: &ActivateMembershipInput) -> AppResult<bool>;

    /// Returns `false` when no local row exists for `id`.
    async fn update_status(&self, id: &str, status: SubscriptionStatus) -> AppResult<bool>;

    /// Move the row's `current_period_end` and the owner's `membership_expires`
    /// forward to `period_end`, as one unit. Returns `false` (and writes
    /// nothing) when no row exists or the stored period already reaches
    /// `period_end`.
    async fn extend_membership(&self, id: &str, period_end: DateTime<Utc>) -> AppResult<bool>;
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Profile>>;
}

#[async_trait]
pub trait WebhookEventRepo: Send + Sync {
    async fn is_processed(&self, event_id: &str) -> AppResult<bool>;
    async fn mark_processed(
        &self,
        event_id: &str,
        event_type: &str,
        resource_id: Option<&str>,
    ) -> AppResult<()>;
}

// ============================================================================
// Outcomes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// This call flipped the user to Pro.
    Activated { expires: DateTime<Utc> },
    /// A local row already existed; nothing was written.
    AlreadyActivated,
    /// Remote status does not allow activation yet. Not an error.
    NotActiveYet { status: SubscriptionStatus },
}

impl ActivationOutcome {
    pub fn to_check_response(&self) -> CheckActivateResponse {
        match self {
            ActivationOutcome::Activated { .. } => {
                CheckActivateResponse::activated("Subscription activated. Welcome to Pro!")
            }
            ActivationOutcome::AlreadyActivated => {
                CheckActivateResponse::already_activated("Subscription is already active")
            }
            ActivationOutcome::NotActiveYet { status } => CheckActivateResponse::not_active_yet(
                status.as_str(),
                "Subscription is not active yet",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    Processed,
    Duplicate,
    Ignored,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionBillingUseCases {
    provider: Arc<dyn SubscriptionProviderPort>,
    plans: Arc<PlanProvisioner>,
    subscriptions: Arc<dyn SubscriptionRepo>,
    profiles: Arc<dyn ProfileRepo>,
    webhook_events: Arc<dyn WebhookEventRepo>,
}

impl SubscriptionBillingUseCases {
    pub fn new(
        provider: Arc<dyn SubscriptionProviderPort>,
        plans: Arc<PlanProvisioner>,
        subscriptions: Arc<dyn SubscriptionRepo>,
        profiles: Arc<dyn ProfileRepo>,
        webhook_events: Arc<dyn WebhookEventRepo>,
    ) -> Self {
        Self {
            provider,
            plans,
            subscriptions,
            profiles,
            webhook_events,
        }
    }

    /// Start a Pro subscription for the session user and return the approval link.
    #[instrument(skip(self, email, name))]
    pub async fn create_subscription(
        &self,
        user_id: Uuid,
        email: &str,
        name: &str,
    ) -> AppResult<CreatedSubscription> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::InvalidInput("A valid email is required".into()));
        }
        let name = match name.trim() {
            "" => email.split('@').next().unwrap_or(email).to_string(),
            n => n.to_string(),
        };
        let subscriber = Subscriber {
            user_id,
            email: email.to_string(),
            name,
        };

        let plan_id = self.plans.ensure_plan().await?;
        let created = match self.provider.create_subscription(&plan_id, &subscriber).await {
            Err(AppError::NotFound) => {
                // The cached plan vanished on the provider side
                warn!(plan_id = %plan_id, "Billing plan not found, re-provisioning");
                self.plans.invalidate().await;
                let plan_id = self.plans.ensure_plan().await?;
                self.provider
                    .create_subscription(&plan_id, &subscriber)
                    .await?
            }
            other => other?,
        };

        info!(
            subscription_id = %created.subscription_id,
            status = %created.status,
            "Subscription created, awaiting approval"
        );
        Ok(created)
    }

    /// Provider status for a subscription the session user owns.
    #[instrument(skip(self))]
    pub async fn get_subscription(
        &self,
        user_id: Uuid,
        subscription_id: &str,
    ) -> AppResult<RemoteSubscription> {
        let remote = self.fetch_owned(user_id, subscription_id).await?;
        Ok(remote)
    }

    /// Polling entry point: activate the subscription if the provider says it
    /// is live. Safe to call any number of times.
    #[instrument(skip(self))]
    pub async fn check_and_activate(
        &self,
        user_id: Uuid,
        subscription_id: &str,
    ) -> AppResult<ActivationOutcome> {
        let remote = self.fetch_owned(user_id, subscription_id).await?;
        self.activate(user_id, &remote).await
    }

    /// Webhook entry point. The owner comes from the provider's `custom_id`,
    /// which is trusted here because the delivery was verified upstream.
    ///
    /// For a subscription that is already active locally this is a renewal:
    /// the paid period is extended to the provider's next billing time.
    #[instrument(skip(self))]
    pub async fn activate_from_webhook(
        &self,
        subscription_id: &str,
    ) -> AppResult<ActivationOutcome> {
        let id = SubscriptionId::parse(subscription_id)?;
        let remote = self.provider.get_subscription(&id).await?;
        let owner = remote.owner_id().ok_or_else(|| {
            AppError::InvalidInput(format!("Subscription {} has no owner passthrough", id))
        })?;

        let outcome = self.activate(owner, &remote).await?;
        if outcome == ActivationOutcome::AlreadyActivated {
            self.extend_paid_period(&remote).await?;
        }
        Ok(outcome)
    }

    /// Cancel remotely, then mirror the cancellation on the local row.
    /// The profile keeps Pro until `membership_expires`.
    #[instrument(skip(self, reason))]
    pub async fn cancel_subscription(
        &self,
        user_id: Uuid,
        subscription_id: &str,
        reason: Option<&str>,
    ) -> AppResult<()> {
        let remote = self.fetch_owned(user_id, subscription_id).await?;
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_CANCEL_REASON);

        self.provider.cancel_subscription(&remote.id, reason).await?;

        let had_row = self
            .subscriptions
            .update_status(remote.id.as_str(), SubscriptionStatus::Cancelled)
            .await?;
        info!(subscription_id = %remote.id, had_local_row = had_row, "Subscription cancelled");
        Ok(())
    }

    /// Verify, de-duplicate and apply a provider webhook delivery.
    ///
    /// Retryable failures are returned as errors and the event is not
    /// recorded, so the provider redelivers it.
    #[instrument(skip(self, headers, body))]
    pub async fn handle_webhook(
        &self,
        headers: &WebhookHeaders,
        body: &str,
    ) -> AppResult<WebhookDisposition> {
        if !self.provider.verify_webhook(headers, body).await? {
            return Err(AppError::InvalidInput("Invalid webhook signature".into()));
        }

        let event: WebhookEvent = serde_json::from_str(body)
            .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {}", e)))?;

        if self.webhook_events.is_processed(&event.id).await? {
            info!(event_id = %event.id, "Webhook event already processed");
            return Ok(WebhookDisposition::Duplicate);
        }

        let disposition = match self.apply_event(&event).await {
            Ok(d) => d,
            Err(e) if e.is_retryable() => {
                warn!(
                    error = %e,
                    event_id = %event.id,
                    event_type = %event.event_type,
                    retryable = true,
                    "Webhook processing failed"
                );
                return Err(e);
            }
            Err(e) => {
                // Will not change on redelivery
                warn!(
                    error = %e,
                    event_id = %event.id,
                    event_type = %event.event_type,
                    retryable = false,
                    "Webhook event skipped"
                );
                WebhookDisposition::Ignored
            }
        };

        self.webhook_events
            .mark_processed(&event.id, &event.event_type, event.resource_id())
            .await?;
        Ok(disposition)
    }

    /// The user's profile; users never billed get a default free profile.
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Profile> {
        Ok(self
            .profiles
            .get_by_user_id(user_id)
            .await?
            .unwrap_or(Profile {
                user_id,
                email: None,
                membership_status: MembershipStatus::Free,
                membership_plan: None,
                membership_expires: None,
                updated_at: None,
            }))
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn fetch_owned(
        &self,
        user_id: Uuid,
        subscription_id: &str,
    ) -> AppResult<RemoteSubscription> {
        let id = SubscriptionId::parse(subscription_id)?;
        let remote = self.provider.get_subscription(&id).await?;

        if !remote.is_owned_by(user_id) {
            warn!(
                subscription_id = %id,
                %user_id,
                "Subscription owner does not match session user"
            );
            return Err(AppError::OwnershipMismatch);
        }
        Ok(remote)
    }

    async fn activate(
        &self,
        owner: Uuid,
        remote: &RemoteSubscription,
    ) -> AppResult<ActivationOutcome> {
        if !remote.status.is_activatable() {
            return Ok(ActivationOutcome::NotActiveYet {
                status: remote.status,
            });
        }

        if self.subscriptions.get_by_id(remote.id.as_str()).await?.is_some() {
            return Ok(ActivationOutcome::AlreadyActivated);
        }

        let now = Utc::now();
        let expires = membership_expiry(remote.next_billing_time, now);
        let input = ActivateMembershipInput {
            subscription: Subscription {
                id: remote.id.as_str().to_string(),
                user_id: owner,
                status: remote.status,
                plan_id: remote.plan_id.clone().unwrap_or_default(),
                current_period_start: remote.start_time,
                current_period_end: remote.next_billing_time,
                amount_cents: remote.last_payment.as_ref().map(|m| m.amount_cents),
                currency: remote.last_payment.as_ref().map(|m| m.currency.clone()),
                is_trial: remote.is_trial,
                created_at: None,
                updated_at: None,
            },
            membership_plan: PRO_MONTHLY_PLAN.to_string(),
            membership_expires: expires,
        };

        if self.subscriptions.activate_membership(&input).await? {
            info!(
                subscription_id = %remote.id,
                user_id = %owner,
                expires = %expires,
                "Membership activated"
            );
            Ok(ActivationOutcome::Activated { expires })
        } else {
            // Lost the race against a concurrent activation
            Ok(ActivationOutcome::AlreadyActivated)
        }
    }

    /// Renewal: push the paid period out to the provider's next billing time.
    async fn extend_paid_period(&self, remote: &RemoteSubscription) -> AppResult<bool> {
        if !remote.status.is_activatable() {
            return Ok(false);
        }
        let Some(next) = remote.next_billing_time.filter(|t| *t > Utc::now()) else {
            return Ok(false);
        };

        let extended = self
            .subscriptions
            .extend_membership(remote.id.as_str(), next)
            .await?;
        if extended {
            info!(subscription_id = %remote.id, expires = %next, "Membership period extended");
        }
        Ok(extended)
    }

    async fn apply_event(&self, event: &WebhookEvent) -> AppResult<WebhookDisposition> {
        let kind = event.kind();
        if kind == SubscriptionEventKind::Other {
            tracing::debug!(event_type = %event.event_type, "Unhandled webhook event type");
            return Ok(WebhookDisposition::Ignored);
        }

        let subscription_id = event.subscription_id().ok_or_else(|| {
            AppError::InvalidInput("Webhook resource has no subscription id".into())
        })?;

        let synced_status = match kind {
            SubscriptionEventKind::Cancelled => Some(SubscriptionStatus::Cancelled),
            SubscriptionEventKind::Suspended => Some(SubscriptionStatus::Suspended),
            SubscriptionEventKind::Expired => Some(SubscriptionStatus::Expired),
            _ => None,
        };

        match synced_status {
            Some(status) => {
                let had_row = self
                    .subscriptions
                    .update_status(subscription_id, status)
                    .await?;
                info!(
                    subscription_id,
                    %status,
                    had_local_row = had_row,
                    "Subscription status synced"
                );
            }
            None => {
                let outcome = self.activate_from_webhook(subscription_id).await?;
                info!(subscription_id, ?outcome, "Webhook activation handled");
            }
        }

        Ok(WebhookDisposition::Processed)
    }
}

/// Next billing time when it is still ahead of `now`, else the fallback window.
fn membership_expiry(
    next_billing_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    next_billing_time
        .filter(|t| *t > now)
        .unwrap_or_else(|| now + Duration::days(FALLBACK_MEMBERSHIP_DAYS))
}
