use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::get_env_default;
use secrecy::SecretString;
use url::Url;

use crate::{
    application::ports::subscription_provider::PlanDefinition, infra::error::InfraError,
};

pub const PAYPAL_SANDBOX_BASE: &str = "https://api-m.sandbox.paypal.com";
pub const PAYPAL_LIVE_BASE: &str = "https://api-m.paypal.com";

/// Credentials and redirect targets for the PayPal REST API.
#[derive(Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub api_base: Url,
    pub webhook_id: String,
    pub brand_name: String,
    /// Where PayPal sends the browser after approval.
    pub return_url: Url,
    pub cancel_url: Url,
}

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub paypal: PayPalConfig,
    pub pro_plan_name: String,
    pub pro_plan_price: String,
    pub pro_plan_currency: String,
    /// `None` caches the plan id for the process lifetime.
    pub plan_cache_ttl: Option<std::time::Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let jwt_secret = SecretString::new(required("JWT_SECRET")?.into());
        let database_url = required("DATABASE_URL")?;

        let app_origin: Url = required("APP_ORIGIN")?
            .parse()
            .map_err(|_| InfraError::ConfigInvalid { var: "APP_ORIGIN" })?;
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid { var: "CORS_ORIGIN" })?;
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", String::from("127.0.0.1:3001"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid { var: "BIND_ADDR" })?;

        let mode: String = get_env_default("PAYPAL_MODE", String::from("sandbox"));
        let api_base = paypal_api_base(&mode, std::env::var("PAYPAL_API_BASE").ok().as_deref())?;

        let paypal = PayPalConfig {
            client_id: required("PAYPAL_CLIENT_ID")?,
            client_secret: SecretString::new(required("PAYPAL_CLIENT_SECRET")?.into()),
            api_base,
            webhook_id: required("PAYPAL_WEBHOOK_ID")?,
            brand_name: get_env_default("BRAND_NAME", String::from("BookingGen")),
            return_url: join(&app_origin, "/subscription/success")?,
            cancel_url: join(&app_origin, "/pricing")?,
        };

        let pro_plan_price: String = get_env_default("PRO_PLAN_PRICE", String::from("9.99"));
        if !is_decimal_price(&pro_plan_price) {
            return Err(InfraError::ConfigInvalid {
                var: "PRO_PLAN_PRICE",
            });
        }

        let ttl_secs: u64 = get_env_default("PLAN_CACHE_TTL_SECS", 0);

        Ok(Self {
            jwt_secret,
            app_origin,
            cors_origin,
            bind_addr,
            database_url,
            paypal,
            pro_plan_name: get_env_default("PRO_PLAN_NAME", String::from("BookingGen Pro Monthly")),
            pro_plan_price,
            pro_plan_currency: get_env_default("PRO_PLAN_CURRENCY", String::from("USD")),
            plan_cache_ttl: (ttl_secs > 0).then(|| std::time::Duration::from_secs(ttl_secs)),
        })
    }

    pub fn plan_definition(&self) -> PlanDefinition {
        PlanDefinition {
            product_name: format!("{} Pro", self.paypal.brand_name),
            product_description: format!("{} Pro membership", self.paypal.brand_name),
            plan_name: self.pro_plan_name.clone(),
            price: self.pro_plan_price.clone(),
            currency: self.pro_plan_currency.clone(),
        }
    }
}

fn required(var: &'static str) -> Result<String, InfraError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(InfraError::ConfigMissing { var })
}

fn join(origin: &Url, path: &str) -> Result<Url, InfraError> {
    origin
        .join(path)
        .map_err(|_| InfraError::ConfigInvalid { var: "APP_ORIGIN" })
}

/// `PAYPAL_API_BASE` wins over the mode when set.
pub fn paypal_api_base(mode: &str, override_base: Option<&str>) -> Result<Url, InfraError> {
    let raw = match override_base.map(str::trim).filter(|s| !s.is_empty()) {
        Some(base) => base,
        None if mode.eq_ignore_ascii_case("live") => PAYPAL_LIVE_BASE,
        None if mode.eq_ignore_ascii_case("sandbox") => PAYPAL_SANDBOX_BASE,
        None => return Err(InfraError::ConfigInvalid { var: "PAYPAL_MODE" }),
    };
    raw.parse()
        .map_err(|_| InfraError::ConfigInvalid {
            var: "PAYPAL_API_BASE",
        })
}

/// Digits with an optional fraction of at most two digits, as PayPal expects.
fn is_decimal_price(price: &str) -> bool {
    let (whole, fraction) = match price.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (price, None),
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    digits(whole) && fraction.is_none_or(|f| digits(f) && f.len() <= 2)
}
