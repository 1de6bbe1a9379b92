use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::app_error::{AppError, AppResult};
use crate::application::ports::billing_provider::{BillingProviderPort, CheckoutSessionParams};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Tolerance for the signed timestamp in webhook signatures.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
}

impl StripeClient {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            secret_key,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    async fn get(&self, path: &str) -> AppResult<JsonValue> {
        let response = self
            .client
            .get(format!("{}{}", STRIPE_API_BASE, path))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Billing request failed: {}", e)))?;

        handle_response(response).await
    }

    async fn post_form(&self, path: &str, params: &[(String, String)]) -> AppResult<JsonValue> {
        let response = self
            .client
            .post(format!("{}{}", STRIPE_API_BASE, path))
            .header("Authorization", self.auth_header())
            .form(params)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Billing request failed: {}", e)))?;

        handle_response(response).await
    }

    // ========================================================================
    // Webhook Signature Verification
    // ========================================================================

    /// Verify a `Stripe-Signature` header (`t=timestamp,v1=signature,...`)
    /// against the raw body with HMAC-SHA256 and a constant-time compare.
    pub fn verify_webhook_signature(
        payload: &str,
        signature_header: &str,
        webhook_secret: &str,
    ) -> AppResult<()> {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            let kv: Vec<&str> = part.splitn(2, '=').collect();
            if kv.len() != 2 {
                continue;
            }
            match kv[0] {
                "t" => timestamp = Some(kv[1]),
                "v1" => signatures.push(kv[1]),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| AppError::InvalidInput("Missing timestamp in signature".into()))?;

        if signatures.is_empty() {
            return Err(AppError::InvalidInput("Missing signature".into()));
        }

        let signed_payload = format!("{}.{}", timestamp, payload);
        let mut mac = Hmac::<Sha256>::new_from_slice(webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal("HMAC error".into()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        for sig in signatures {
            if constant_time_compare(sig, &expected) {
                let ts: i64 = timestamp
                    .parse()
                    .map_err(|_| AppError::InvalidInput("Invalid timestamp".into()))?;
                let now = chrono::Utc::now().timestamp();
                if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
                    return Err(AppError::InvalidInput("Timestamp too old".into()));
                }
                return Ok(());
            }
        }

        Err(AppError::InvalidInput("Invalid signature".into()))
    }
}

// ============================================================================
// BillingProviderPort
// ============================================================================

#[async_trait]
impl BillingProviderPort for StripeClient {
    async fn retrieve_subscription(&self, subscription_id: &str) -> AppResult<JsonValue> {
        self.get(&format!("/subscriptions/{}", subscription_id)).await
    }

    async fn cancel_at_period_end(&self, subscription_id: &str) -> AppResult<JsonValue> {
        self.post_form(
            &format!("/subscriptions/{}", subscription_id),
            &[("cancel_at_period_end".to_string(), "true".to_string())],
        )
        .await
    }

    async fn retrieve_customer(&self, customer_id: &str) -> AppResult<JsonValue> {
        self.get(&format!("/customers/{}", customer_id)).await
    }

    async fn create_customer(
        &self,
        email: &str,
        metadata: HashMap<String, String>,
    ) -> AppResult<JsonValue> {
        let mut params: Vec<(String, String)> = vec![("email".to_string(), email.to_string())];
        for (key, value) in metadata {
            params.push((format!("metadata[{}]", key), value));
        }
        self.post_form("/customers", &params).await
    }

    async fn create_checkout_session(
        &self,
        checkout: &CheckoutSessionParams,
    ) -> AppResult<JsonValue> {
        let mut params: Vec<(String, String)> = vec![
            ("customer".to_string(), checkout.customer_id.clone()),
            ("mode".to_string(), "subscription".to_string()),
            ("line_items[0][price]".to_string(), checkout.price_id.clone()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), checkout.success_url.clone()),
            ("cancel_url".to_string(), checkout.cancel_url.clone()),
        ];

        for (key, value) in &checkout.metadata {
            params.push((format!("metadata[{}]", key), value.clone()));
        }

        if checkout.trial_days > 0 {
            params.push((
                "subscription_data[trial_period_days]".to_string(),
                checkout.trial_days.to_string(),
            ));
        }

        self.post_form("/checkout/sessions", &params).await
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<JsonValue> {
        self.get(&format!("/checkout/sessions/{}", session_id)).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn handle_response(response: reqwest::Response) -> AppResult<JsonValue> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AppError::Provider(format!("Failed to read response: {}", e)))?;

    if !status.is_success() {
        tracing::error!(status = %status, body = %body, "Billing provider API error");

        if let Ok(error) = serde_json::from_str::<StripeErrorResponse>(&body) {
            return Err(AppError::Provider(
                error.error.message.unwrap_or(error.error.error_type),
            ));
        }

        return Err(AppError::Provider(format!(
            "Billing provider API error: {}",
            status
        )));
    }

    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse billing provider response");
        AppError::Provider(format!("Failed to parse provider response: {}", e))
    })
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    #[serde(rename = "type")]
    error_type: String,
    message: Option<String>,
}
