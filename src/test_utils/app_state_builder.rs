//! Test app state builder for HTTP-level integration testing.
//!
//! `TestAppStateBuilder` creates an `AppState` whose use cases run against the
//! in-memory store and the fake provider. Handles to both stay available for
//! assertions after `build()`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt,
        use_cases::{
            plan_provisioner::PlanProvisioner, subscription_billing::SubscriptionBillingUseCases,
        },
    },
    domain::entities::{profile::Profile, subscription::Subscription},
    infra::config::{AppConfig, PayPalConfig},
    test_utils::{
        FakeSubscriptionProvider, InMemoryBillingStore, InMemoryWebhookEventRepo, test_plan_definition,
    },
};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-with-enough-entropy";

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let builder = TestAppStateBuilder::new().with_profile(create_test_profile(user, |_| {}));
/// let provider = builder.provider();
/// let token = session_token(&builder, user);
/// let app_state = builder.build();
/// ```
pub struct TestAppStateBuilder {
    provider: Arc<FakeSubscriptionProvider>,
    store: Arc<InMemoryBillingStore>,
    events: Arc<InMemoryWebhookEventRepo>,
    jwt_secret: SecretString,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            provider: Arc::new(FakeSubscriptionProvider::new()),
            store: Arc::new(InMemoryBillingStore::new()),
            events: Arc::new(InMemoryWebhookEventRepo::new()),
            jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        }
    }

    pub fn with_profile(self, profile: Profile) -> Self {
        self.store.insert_profile(profile);
        self
    }

    pub fn with_subscription(self, subscription: Subscription) -> Self {
        self.store.insert_subscription(subscription);
        self
    }

    pub fn provider(&self) -> Arc<FakeSubscriptionProvider> {
        self.provider.clone()
    }

    pub fn store(&self) -> Arc<InMemoryBillingStore> {
        self.store.clone()
    }

    pub fn events(&self) -> Arc<InMemoryWebhookEventRepo> {
        self.events.clone()
    }

    pub fn jwt_secret(&self) -> &SecretString {
        &self.jwt_secret
    }

    pub fn build(self) -> AppState {
        let plans = Arc::new(PlanProvisioner::new(
            self.provider.clone(),
            test_plan_definition(),
            None,
        ));
        let billing_use_cases = SubscriptionBillingUseCases::new(
            self.provider.clone(),
            plans,
            self.store.clone(),
            self.store.clone(),
            self.events.clone(),
        );

        AppState {
            config: Arc::new(test_config(self.jwt_secret)),
            billing_use_cases: Arc::new(billing_use_cases),
        }
    }
}

/// Session token for `user_id` signed with the builder's secret.
pub fn session_token(builder: &TestAppStateBuilder, user_id: Uuid) -> String {
    jwt::issue(
        user_id,
        Some("u1@x.com"),
        builder.jwt_secret(),
        time::Duration::hours(1),
    )
    .expect("Failed to issue test token")
}

fn test_config(jwt_secret: SecretString) -> AppConfig {
    let origin: url::Url = "http://localhost:3000".parse().expect("valid url");
    AppConfig {
        jwt_secret,
        app_origin: origin.clone(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
        database_url: "postgres://unused".to_string(),
        paypal: PayPalConfig {
            client_id: "test-client".to_string(),
            client_secret: SecretString::new("test-secret".into()),
            api_base: "http://127.0.0.1:9".parse().expect("valid url"),
            webhook_id: "WH-TEST".to_string(),
            brand_name: "BookingGen".to_string(),
            return_url: origin.join("/subscription/success").expect("valid url"),
            cancel_url: origin.join("/pricing").expect("valid url"),
        },
        pro_plan_name: test_plan_definition().plan_name,
        pro_plan_price: "9.99".to_string(),
        pro_plan_currency: "USD".to_string(),
        plan_cache_ttl: None,
    }
}
