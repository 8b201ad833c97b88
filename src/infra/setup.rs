use crate::{
    adapters::http::app_state::AppState,
    infra::{config::AppConfig, error::InfraError, paypal_client::PayPalClient, postgres_persistence},
    use_cases::{
        plan_provisioner::PlanProvisioner,
        subscription_billing::{
            ProfileRepo, SubscriptionBillingUseCases, SubscriptionRepo, WebhookEventRepo,
        },
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> Result<AppState, InfraError> {
    let config = AppConfig::from_env()?;

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);
    let provider = Arc::new(PayPalClient::new(config.paypal.clone())?);

    let plans = Arc::new(PlanProvisioner::new(
        provider.clone(),
        config.plan_definition(),
        config.plan_cache_ttl,
    ));

    let billing_use_cases = SubscriptionBillingUseCases::new(
        provider,
        plans,
        postgres_arc.clone() as Arc<dyn SubscriptionRepo>,
        postgres_arc.clone() as Arc<dyn ProfileRepo>,
        postgres_arc as Arc<dyn WebhookEventRepo>,
    );

    Ok(AppState {
        config: Arc::new(config),
        billing_use_cases: Arc::new(billing_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bookinggen_billing=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs); console-only when the file can't be created
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
