//! Billing provider webhook endpoint.
//!
//! Deliveries are authenticated by the provider's signature header before any
//! parsing happens. Every verified delivery is acknowledged with 200, including
//! event types we do not act on, so the provider does not retry them forever.

use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use serde_json::json;
use tracing::{debug, warn};

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    infra::stripe_client::StripeClient,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/billing", post(handle_webhook))
}

/// POST /webhooks/billing
async fn handle_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<impl IntoResponse> {
    let Some(webhook_secret) = app_state.config.billing_webhook_secret.as_deref() else {
        warn!("Rejected webhook delivery: BILLING_WEBHOOK_SECRET is not set");
        return Err(AppError::BillingNotConfigured);
    };

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::InvalidInput("Missing webhook signature header".into()))?;

    if let Err(err) = StripeClient::verify_webhook_signature(&body, signature, webhook_secret) {
        warn!(error = %err, "Rejected webhook delivery: signature verification failed");
        return Err(AppError::InvalidInput(
            "Invalid webhook signature. Check that BILLING_WEBHOOK_SECRET matches the \
             whsec_... secret for this endpoint."
                .into(),
        ));
    }

    let event: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Malformed webhook payload: {e}")))?;

    let event_type = event["type"].as_str().unwrap_or("");
    let object = &event["data"]["object"];
    let billing = &app_state.billing_use_cases;

    match event_type {
        "customer.subscription.created" => billing.handle_subscription_created(object).await?,
        "customer.subscription.updated" => billing.handle_subscription_updated(object).await?,
        "customer.subscription.deleted" => billing.handle_subscription_deleted(object).await?,
        "invoice.paid" | "invoice.payment_succeeded" => {
            billing.handle_invoice_payment_succeeded(object).await?
        }
        "invoice.payment_failed" => billing.handle_invoice_payment_failed(object).await?,
        "checkout.session.completed" => billing.handle_checkout_session_completed(object).await?,
        other => {
            debug!(event_type = other, "Ignoring unhandled webhook event type");
        }
    }

    Ok(Json(json!({"status": "success"})))
}
