//! Port over the external billing provider.
//!
//! Every method returns the provider's raw key-value payload rather than a
//! typed struct: webhook envelopes and API call results carry the same fields
//! in slightly different shapes, and the reconciler reads both through the
//! [`SubscriptionPayload`](crate::application::use_cases::provider_payload::SubscriptionPayload)
//! accessor.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::app_error::AppResult;

/// Parameters for creating a hosted checkout session for one recurring price.
#[derive(Debug, Clone)]
pub struct CheckoutSessionParams {
    pub customer_id: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: HashMap<String, String>,
    pub trial_days: i64,
}

#[async_trait]
pub trait BillingProviderPort: Send + Sync {
    /// Fetch the authoritative subscription object by provider id.
    async fn retrieve_subscription(&self, subscription_id: &str) -> AppResult<JsonValue>;

    /// Request cancellation at period end; returns the updated subscription.
    async fn cancel_at_period_end(&self, subscription_id: &str) -> AppResult<JsonValue>;

    async fn retrieve_customer(&self, customer_id: &str) -> AppResult<JsonValue>;

    /// Create a customer tagged with correlation metadata (`user_id`).
    async fn create_customer(
        &self,
        email: &str,
        metadata: HashMap<String, String>,
    ) -> AppResult<JsonValue>;

    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> AppResult<JsonValue>;

    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<JsonValue>;
}
