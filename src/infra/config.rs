use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub app_origin: String,
    pub cors_origin: HeaderValue,
    /// Billing provider secret key. Optional: when absent the app runs with
    /// billing disabled and billing operations return a configuration error.
    pub billing_secret_key: Option<SecretString>,
    /// Webhook signing secret. Optional for the same reason; the webhook
    /// endpoint rejects deliveries until it is set.
    pub billing_webhook_secret: Option<String>,
    /// Recurring price id for the subscription product.
    pub subscription_price_id: Option<String>,
    /// Publishable key, handed to the checkout page.
    pub billing_publishable_key: Option<String>,
    pub subscription_trial_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3001".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let app_origin: String = get_env_default("APP_ORIGIN", "http://localhost:3000".to_string());
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        // Billing keys are read leniently: a missing key disables billing at
        // runtime instead of refusing to boot.
        let billing_secret_key = std::env::var("BILLING_SECRET_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .map(SecretString::from);
        let billing_webhook_secret = std::env::var("BILLING_WEBHOOK_SECRET")
            .ok()
            .filter(|v| !v.is_empty());
        let subscription_price_id = std::env::var("SUBSCRIPTION_PRICE_ID")
            .ok()
            .filter(|v| !v.is_empty());
        let billing_publishable_key = std::env::var("BILLING_PUBLISHABLE_KEY")
            .ok()
            .filter(|v| !v.is_empty());
        let subscription_trial_days: i64 = get_env_default("SUBSCRIPTION_TRIAL_DAYS", 0);

        Self {
            bind_addr,
            database_url,
            app_origin,
            cors_origin,
            billing_secret_key,
            billing_webhook_secret,
            subscription_price_id,
            billing_publishable_key,
            subscription_trial_days,
        }
    }
}
