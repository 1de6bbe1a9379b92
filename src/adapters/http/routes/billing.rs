use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{app_state::AppState, extract::CurrentUser},
    app_error::AppResult,
    domain::entities::subscription::Subscription,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/checkout/confirm", get(confirm_checkout))
        .route("/cancel", post(cancel_subscription))
        .route("/subscription", get(get_subscription))
}

#[derive(Serialize)]
struct CheckoutResponse {
    url: String,
}

/// POST /billing/checkout
async fn create_checkout(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let url = app_state.billing_use_cases.create_checkout(&user).await?;
    Ok(Json(CheckoutResponse { url }))
}

#[derive(Deserialize)]
struct ConfirmCheckoutQuery {
    session_id: String,
}

/// GET /billing/checkout/confirm?session_id=...
///
/// Hit by the success redirect so the subscription is usable immediately,
/// before the corresponding webhook delivery lands.
async fn confirm_checkout(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ConfirmCheckoutQuery>,
) -> AppResult<impl IntoResponse> {
    let updated = app_state
        .billing_use_cases
        .confirm_checkout(&user, &query.session_id)
        .await?;
    Ok(Json(SubscriptionView::from(&updated)))
}

#[derive(Serialize)]
struct SubscriptionView {
    status: String,
    is_active: bool,
    in_trial: bool,
    cancel_at_period_end: bool,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    trial_end: Option<DateTime<Utc>>,
    days_until_renewal: Option<i64>,
}

impl From<&Subscription> for SubscriptionView {
    fn from(s: &Subscription) -> Self {
        Self {
            status: s.status.as_str().to_string(),
            is_active: s.is_active(),
            in_trial: s.is_in_trial(),
            cancel_at_period_end: s.cancel_at_period_end,
            current_period_start: s.current_period_start,
            current_period_end: s.current_period_end,
            trial_end: s.trial_end,
            days_until_renewal: s.days_until_renewal(),
        }
    }
}

#[derive(Serialize)]
struct SubscriptionResponse {
    subscription: Option<SubscriptionView>,
    has_access: bool,
    billing_configured: bool,
    publishable_key: Option<String>,
}

/// GET /billing/subscription
async fn get_subscription(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let billing = &app_state.billing_use_cases;
    let subscription = billing.subscription_for_user(user.id).await?;
    let has_access = billing.has_feature_access(&user).await?;

    Ok(Json(SubscriptionResponse {
        subscription: subscription.as_ref().map(SubscriptionView::from),
        has_access,
        billing_configured: billing.is_configured(),
        publishable_key: app_state.config.billing_publishable_key.clone(),
    }))
}

/// POST /billing/cancel
async fn cancel_subscription(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    let updated = app_state.billing_use_cases.cancel(&user).await?;
    Ok(Json(SubscriptionView::from(&updated)))
}
