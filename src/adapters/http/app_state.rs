use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    infra::config::AppConfig, use_cases::subscription_billing::SubscriptionBillingUseCases,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub billing_use_cases: Arc<SubscriptionBillingUseCases>,
}

impl FromRef<AppState> for Arc<SubscriptionBillingUseCases> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.billing_use_cases.clone()
    }
}
