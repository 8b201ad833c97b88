use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::{
    app_error::AppResult,
    application::ports::subscription_provider::{PlanDefinition, SubscriptionProviderPort},
};

struct CachedPlan {
    id: String,
    fetched_at: Instant,
}

/// Find-or-create for the single recurring Pro plan.
///
/// The resolved id is kept in this struct, not in a global. The lock is held
/// across the whole lookup so concurrent cold-start callers in one process
/// provision at most once.
pub struct PlanProvisioner {
    provider: Arc<dyn SubscriptionProviderPort>,
    definition: PlanDefinition,
    /// `None` keeps the id for the lifetime of the provisioner.
    ttl: Option<Duration>,
    cache: Mutex<Option<CachedPlan>>,
}

impl PlanProvisioner {
    pub fn new(
        provider: Arc<dyn SubscriptionProviderPort>,
        definition: PlanDefinition,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            provider,
            definition,
            ttl,
            cache: Mutex::new(None),
        }
    }

    /// Returns the plan id, provisioning it remotely if no plan with the
    /// configured name exists yet.
    #[instrument(skip(self), fields(plan_name = %self.definition.plan_name))]
    pub async fn ensure_plan(&self) -> AppResult<String> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            let fresh = self
                .ttl
                .map(|ttl| cached.fetched_at.elapsed() < ttl)
                .unwrap_or(true);
            if fresh {
                return Ok(cached.id.clone());
            }
        }

        let existing = self
            .provider
            .list_plans()
            .await?
            .into_iter()
            .find(|p| p.name == self.definition.plan_name && p.is_active());

        let plan_id = match existing {
            Some(plan) => {
                info!(plan_id = %plan.id, "Reusing existing billing plan");
                plan.id
            }
            None => {
                let product_id = self.provider.create_product(&self.definition).await?;
                let plan = self.provider.create_plan(&product_id, &self.definition).await?;
                info!(plan_id = %plan.id, product_id = %product_id, "Created billing plan");
                plan.id
            }
        };

        *cache = Some(CachedPlan {
            id: plan_id.clone(),
            fetched_at: Instant::now(),
        });
        Ok(plan_id)
    }

    /// Drop the cached id so the next call looks the plan up again.
    pub async fn invalidate(&self) {
        self.cache.lock().await.take();
    }

    #[cfg(test)]
    pub async fn cached_plan_id(&self) -> Option<String> {
        self.cache.lock().await.as_ref().map(|c| c.id.clone())
    }
}
