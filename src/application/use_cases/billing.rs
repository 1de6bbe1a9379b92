//! Subscription billing use cases: reconciliation against the billing
//! provider, customer/checkout bootstrapping, cancellation and the admin
//! re-sync used by the CLI.
//!
//! The reconciler is the single writer of provider-owned subscription fields.
//! It treats the provider as the source of truth: webhook payloads may embed
//! stale snapshots, so the billing period is always taken from a live
//! re-fetch when one is possible, with the embedded payload as fallback.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::ports::billing_provider::{BillingProviderPort, CheckoutSessionParams};
use crate::application::use_cases::provider_payload::{
    PeriodBounds, SubscriptionPayload, timestamp_to_utc,
};
use crate::domain::entities::subscription::{Subscription, SubscriptionStatus};
use crate::domain::entities::user::User;

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;
}

#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub status: SubscriptionStatus,
    pub provider_customer_id: Option<String>,
    pub provider_subscription_id: Option<String>,
}

/// One reconciliation's worth of field changes, applied as a single atomic
/// row update. `None` keeps the stored value; `Some` replaces it. This is
/// what makes concurrent webhook deliveries for the same subscription safe
/// without explicit locking.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub status: Option<SubscriptionStatus>,
    pub provider_subscription_id: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: Option<bool>,
}

#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Subscription>>;

    async fn get_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> AppResult<Option<Subscription>>;

    async fn get_by_provider_customer_id(
        &self,
        provider_customer_id: &str,
    ) -> AppResult<Option<Subscription>>;

    async fn create(&self, input: &NewSubscription) -> AppResult<Subscription>;

    async fn apply_update(&self, id: Uuid, update: &SubscriptionUpdate)
    -> AppResult<Subscription>;

    async fn set_provider_customer_id(
        &self,
        id: Uuid,
        provider_customer_id: &str,
    ) -> AppResult<Subscription>;

    /// Hard-stop on provider-side deletion: Canceled, flag cleared, period
    /// ended at `ended_at`.
    async fn mark_canceled(&self, id: Uuid, ended_at: DateTime<Utc>) -> AppResult<Subscription>;
}

// ============================================================================
// Sync Report (CLI)
// ============================================================================

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub email: String,
    pub provider_subscription_id: String,
    pub status: SubscriptionStatus,
    pub previous_period_end: Option<DateTime<Utc>>,
    pub refreshed_period_end: Option<DateTime<Utc>>,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct BillingUseCases {
    user_repo: Arc<dyn UserRepo>,
    subscription_repo: Arc<dyn SubscriptionRepo>,
    /// Absent when no billing secret key is configured. Operations that need
    /// the provider fail with `BillingNotConfigured` before any network call.
    provider: Option<Arc<dyn BillingProviderPort>>,
    price_id: Option<String>,
    trial_days: i64,
    app_origin: String,
}

impl BillingUseCases {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        subscription_repo: Arc<dyn SubscriptionRepo>,
        provider: Option<Arc<dyn BillingProviderPort>>,
        price_id: Option<String>,
        trial_days: i64,
        app_origin: String,
    ) -> Self {
        Self {
            user_repo,
            subscription_repo,
            provider,
            price_id,
            trial_days,
            app_origin,
        }
    }

    fn provider(&self) -> AppResult<&Arc<dyn BillingProviderPort>> {
        self.provider.as_ref().ok_or(AppError::BillingNotConfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some() && self.price_id.is_some()
    }

    // ========================================================================
    // Reconciler
    // ========================================================================

    /// Merge provider truth into the local record.
    ///
    /// Status, trial end and the cancel flag come from `payload`. The billing
    /// period comes from a live re-fetch of the subscription (preferring the
    /// locally stored id, then `subscription_id_hint`, then the payload's
    /// own id); if the re-fetch fails the payload's embedded period is used
    /// instead. Applying the same payload twice converges to the same state.
    pub async fn reconcile(
        &self,
        subscription: &Subscription,
        payload: &JsonValue,
        subscription_id_hint: Option<&str>,
    ) -> AppResult<Subscription> {
        let view = SubscriptionPayload::new(payload);

        let status = SubscriptionStatus::from_provider(view.status().unwrap_or("incomplete"));
        let payload_subscription_id = view.id();

        // Adopt the payload's subscription id if the local record has none.
        let adopted_id = match &subscription.provider_subscription_id {
            Some(_) => None,
            None => payload_subscription_id.map(str::to_string),
        };

        let refresh_id = subscription
            .provider_subscription_id
            .as_deref()
            .or(subscription_id_hint)
            .or(payload_subscription_id);

        let (start_ts, end_ts) = validated_period(match refresh_id {
            Some(id) => match self.fetch_live_subscription(id).await {
                Some(live) => SubscriptionPayload::new(&live).extract_period(),
                None => view.extract_period(),
            },
            None => view.extract_period(),
        });

        let update = SubscriptionUpdate {
            status: Some(status),
            provider_subscription_id: adopted_id,
            current_period_start: start_ts.and_then(timestamp_to_utc),
            current_period_end: end_ts.and_then(timestamp_to_utc),
            trial_end: view.trial_end(),
            // Unlike the period fields, this flag is replaced unconditionally.
            cancel_at_period_end: Some(view.cancel_at_period_end()),
        };

        let updated = self
            .subscription_repo
            .apply_update(subscription.id, &update)
            .await?;

        info!(
            subscription_id = %updated.id,
            status = updated.status.as_str(),
            period_end = ?updated.current_period_end,
            cancel_at_period_end = updated.cancel_at_period_end,
            "Reconciled subscription from provider state"
        );

        Ok(updated)
    }

    /// Best-effort live fetch. Failures degrade to the embedded payload and
    /// never abort the enclosing reconciliation.
    async fn fetch_live_subscription(&self, subscription_id: &str) -> Option<JsonValue> {
        let provider = match &self.provider {
            Some(p) => p,
            None => {
                warn!(
                    subscription_id,
                    "Billing provider not configured, using embedded payload for period data"
                );
                return None;
            }
        };

        match provider.retrieve_subscription(subscription_id).await {
            Ok(live) => Some(live),
            Err(e) => {
                warn!(
                    subscription_id,
                    error = %e,
                    "Could not re-fetch subscription from provider, falling back to embedded payload"
                );
                None
            }
        }
    }

    // ========================================================================
    // Webhook Event Handlers
    // ========================================================================

    /// `customer.subscription.created`: resolve or create the local record,
    /// then reconcile. An unknown customer is resolved through the provider's
    /// correlation metadata (`user_id` set at customer creation).
    pub async fn handle_subscription_created(&self, payload: &JsonValue) -> AppResult<()> {
        let view = SubscriptionPayload::new(payload);

        let customer_id = match view.customer_id() {
            Some(id) => id,
            None => {
                warn!("Subscription created event without customer id, ignoring");
                return Ok(());
            }
        };

        let subscription = match self
            .subscription_repo
            .get_by_provider_customer_id(customer_id)
            .await?
        {
            Some(existing) => existing,
            None => match self.resolve_subscription_via_customer(customer_id, view).await? {
                Some(created) => created,
                None => return Ok(()),
            },
        };

        self.reconcile(&subscription, payload, None).await?;
        Ok(())
    }

    /// No local record for the customer yet: look the customer up at the
    /// provider and map it back to a user via correlation metadata.
    async fn resolve_subscription_via_customer(
        &self,
        customer_id: &str,
        view: SubscriptionPayload<'_>,
    ) -> AppResult<Option<Subscription>> {
        let provider = self.provider()?;
        let customer = provider.retrieve_customer(customer_id).await?;

        let user_id = customer
            .get("metadata")
            .and_then(|m| m.get("user_id"))
            .and_then(JsonValue::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());

        let user_id = match user_id {
            Some(id) => id,
            None => {
                error!(
                    customer_id,
                    "Could not resolve a local user for provider customer (no user_id metadata)"
                );
                return Ok(None);
            }
        };

        let user = match self.user_repo.get_by_id(user_id).await? {
            Some(u) => u,
            None => {
                error!(customer_id, %user_id, "User referenced by customer metadata not found");
                return Ok(None);
            }
        };

        let created = self
            .subscription_repo
            .create(&NewSubscription {
                user_id: user.id,
                status: SubscriptionStatus::from_provider(view.status().unwrap_or("incomplete")),
                provider_customer_id: Some(customer_id.to_string()),
                provider_subscription_id: view.id().map(str::to_string),
            })
            .await?;

        info!(
            subscription_id = %created.id,
            customer_id,
            %user_id,
            "Created local subscription for provider customer"
        );

        Ok(Some(created))
    }

    /// `customer.subscription.updated`: reconcile, or no-op if unknown.
    pub async fn handle_subscription_updated(&self, payload: &JsonValue) -> AppResult<()> {
        let view = SubscriptionPayload::new(payload);

        let provider_subscription_id = match view.id() {
            Some(id) => id,
            None => {
                warn!("Subscription updated event without id, ignoring");
                return Ok(());
            }
        };

        let subscription = match self
            .subscription_repo
            .get_by_provider_subscription_id(provider_subscription_id)
            .await?
        {
            Some(s) => s,
            None => {
                warn!(provider_subscription_id, "Subscription not found, ignoring update event");
                return Ok(());
            }
        };

        self.reconcile(&subscription, payload, None).await?;
        Ok(())
    }

    /// `customer.subscription.deleted`: immediate hard stop. Applies only to
    /// the record matching this exact subscription id, so a racing
    /// resubscription under a new id is unaffected.
    pub async fn handle_subscription_deleted(&self, payload: &JsonValue) -> AppResult<()> {
        let view = SubscriptionPayload::new(payload);

        let provider_subscription_id = match view.id() {
            Some(id) => id,
            None => {
                warn!("Subscription deleted event without id, ignoring");
                return Ok(());
            }
        };

        let subscription = match self
            .subscription_repo
            .get_by_provider_subscription_id(provider_subscription_id)
            .await?
        {
            Some(s) => s,
            None => {
                warn!(provider_subscription_id, "Subscription not found, ignoring delete event");
                return Ok(());
            }
        };

        self.subscription_repo
            .mark_canceled(subscription.id, Utc::now())
            .await?;

        info!(provider_subscription_id, "Subscription marked as canceled");
        Ok(())
    }

    /// `invoice.paid` / `invoice.payment_succeeded`: activate and refresh the
    /// billing period from a live fetch, whether this is the first invoice or
    /// a renewal. Falls back to the invoice's own period fields if the fetch
    /// fails.
    pub async fn handle_invoice_payment_succeeded(&self, payload: &JsonValue) -> AppResult<()> {
        let invoice = SubscriptionPayload::new(payload);

        let provider_subscription_id = match invoice.str_field("subscription") {
            Some(id) => id,
            None => {
                // One-off invoice with no subscription attached.
                return Ok(());
            }
        };

        let subscription = match self
            .subscription_repo
            .get_by_provider_subscription_id(provider_subscription_id)
            .await?
        {
            Some(s) => s,
            None => {
                warn!(
                    provider_subscription_id,
                    "Subscription not found for paid invoice, ignoring"
                );
                return Ok(());
            }
        };

        let (start_ts, end_ts) = validated_period(
            match self.fetch_live_subscription(provider_subscription_id).await {
                Some(live) => SubscriptionPayload::new(&live).extract_period(),
                None => (
                    invoice.i64_field("period_start"),
                    invoice.i64_field("period_end"),
                ),
            },
        );

        let update = SubscriptionUpdate {
            status: Some(SubscriptionStatus::Active),
            current_period_start: start_ts.and_then(timestamp_to_utc),
            current_period_end: end_ts.and_then(timestamp_to_utc),
            ..Default::default()
        };

        let updated = self
            .subscription_repo
            .apply_update(subscription.id, &update)
            .await?;

        info!(
            provider_subscription_id,
            period_start = ?updated.current_period_start,
            period_end = ?updated.current_period_end,
            "Activated subscription and refreshed billing period after payment"
        );

        Ok(())
    }

    /// `invoice.payment_failed`: mark past due, or no-op if unknown.
    pub async fn handle_invoice_payment_failed(&self, payload: &JsonValue) -> AppResult<()> {
        let invoice = SubscriptionPayload::new(payload);

        let provider_subscription_id = match invoice.str_field("subscription") {
            Some(id) => id,
            None => return Ok(()),
        };

        let subscription = match self
            .subscription_repo
            .get_by_provider_subscription_id(provider_subscription_id)
            .await?
        {
            Some(s) => s,
            None => {
                warn!(
                    provider_subscription_id,
                    "Subscription not found for failed invoice, ignoring"
                );
                return Ok(());
            }
        };

        let update = SubscriptionUpdate {
            status: Some(SubscriptionStatus::PastDue),
            ..Default::default()
        };
        self.subscription_repo
            .apply_update(subscription.id, &update)
            .await?;

        info!(provider_subscription_id, "Subscription marked past due");
        Ok(())
    }

    /// `checkout.session.completed`: adopt the session's subscription id onto
    /// the customer's local record and reconcile against a fresh fetch of
    /// that subscription.
    pub async fn handle_checkout_session_completed(&self, payload: &JsonValue) -> AppResult<()> {
        let session = SubscriptionPayload::new(payload);

        let provider_subscription_id = match session.str_field("subscription") {
            Some(id) => id,
            None => {
                warn!("Checkout session completed without a subscription id, ignoring");
                return Ok(());
            }
        };

        let customer_id = session.customer_id().unwrap_or_default();

        let subscription = match self
            .subscription_repo
            .get_by_provider_customer_id(customer_id)
            .await?
        {
            Some(s) => s,
            None => {
                warn!(customer_id, "Subscription not found for checkout customer, ignoring");
                return Ok(());
            }
        };

        let provider = self.provider()?;
        let fresh = provider
            .retrieve_subscription(provider_subscription_id)
            .await?;

        self.reconcile(&subscription, &fresh, Some(provider_subscription_id))
            .await?;

        info!(provider_subscription_id, customer_id, "Checkout completed");
        Ok(())
    }

    // ========================================================================
    // Customer / Checkout Bootstrapping
    // ========================================================================

    /// Reuse the stored provider customer id, or create a new customer tagged
    /// with the user's id as correlation metadata and persist it locally
    /// (creating the subscription row as Incomplete if none exists).
    pub async fn get_or_create_customer(&self, user: &User) -> AppResult<String> {
        let existing = self.subscription_repo.get_by_user_id(user.id).await?;

        if let Some(subscription) = &existing
            && let Some(customer_id) = &subscription.provider_customer_id
        {
            return Ok(customer_id.clone());
        }

        let provider = self.provider()?;

        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), user.id.to_string());

        let customer = provider.create_customer(&user.email, metadata).await?;
        let customer_id = customer
            .get("id")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                AppError::Provider("customer creation response missing id".to_string())
            })?;

        match existing {
            Some(subscription) => {
                self.subscription_repo
                    .set_provider_customer_id(subscription.id, customer_id)
                    .await?;
            }
            None => {
                self.subscription_repo
                    .create(&NewSubscription {
                        user_id: user.id,
                        status: SubscriptionStatus::Incomplete,
                        provider_customer_id: Some(customer_id.to_string()),
                        provider_subscription_id: None,
                    })
                    .await?;
            }
        }

        info!(user_id = %user.id, customer_id, "Created provider customer");
        Ok(customer_id.to_string())
    }

    /// Open a hosted checkout session and return its redirect URL.
    ///
    /// Configuration is validated before any provider call, including the
    /// common misconfiguration of a product id where a price id belongs.
    pub async fn create_checkout(&self, user: &User) -> AppResult<String> {
        let price_id = self
            .price_id
            .as_deref()
            .ok_or(AppError::BillingNotConfigured)?;
        self.provider()?;

        if price_id.starts_with("prod_") {
            return Err(AppError::InvalidInput(
                "The configured subscription price id is a product id. Use a price id \
                 (starts with 'price_'), found under your product's pricing in the \
                 billing dashboard."
                    .to_string(),
            ));
        }

        let customer_id = self.get_or_create_customer(user).await?;

        let mut metadata = HashMap::new();
        metadata.insert("user_id".to_string(), user.id.to_string());

        let params = CheckoutSessionParams {
            customer_id,
            price_id: price_id.to_string(),
            success_url: format!(
                "{}/billing/success?session_id={{CHECKOUT_SESSION_ID}}",
                self.app_origin
            ),
            cancel_url: format!("{}/billing/status", self.app_origin),
            metadata,
            trial_days: self.trial_days,
        };

        let session = self.provider()?.create_checkout_session(&params).await?;

        session
            .get("url")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::Provider("checkout session response missing redirect url".to_string())
            })
    }

    /// Verify a completed checkout session server-side after the redirect
    /// back from the hosted page, without waiting for the webhook delivery.
    /// Adopts the session's subscription and reconciles against a fresh
    /// fetch of it.
    pub async fn confirm_checkout(
        &self,
        user: &User,
        session_id: &str,
    ) -> AppResult<Subscription> {
        let provider = self.provider()?;
        let session = provider.retrieve_checkout_session(session_id).await?;

        let provider_subscription_id = session
            .get("subscription")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| {
                AppError::InvalidInput(
                    "Checkout session has no subscription attached".to_string(),
                )
            })?;

        let subscription = self
            .subscription_repo
            .get_by_user_id(user.id)
            .await?
            .ok_or(AppError::NotFound)?;

        // The session must have been opened for this user's own customer;
        // otherwise a replayed session id would graft someone else's
        // subscription onto the caller's record.
        let session_customer = session.get("customer").and_then(JsonValue::as_str);
        if session_customer.is_none()
            || session_customer != subscription.provider_customer_id.as_deref()
        {
            warn!(
                session_id,
                user_id = %user.id,
                "Checkout session customer does not match the caller's customer"
            );
            return Err(AppError::InvalidInput(
                "Checkout session does not belong to this account".to_string(),
            ));
        }

        let fresh = provider
            .retrieve_subscription(provider_subscription_id)
            .await?;
        let updated = self
            .reconcile(&subscription, &fresh, Some(provider_subscription_id))
            .await?;

        info!(
            session_id,
            provider_subscription_id,
            user_id = %user.id,
            "Confirmed checkout session"
        );
        Ok(updated)
    }

    /// Request cancellation at period end from the provider, then mirror the
    /// confirmed status and flag. There is no local-only cancellation.
    pub async fn cancel(&self, user: &User) -> AppResult<Subscription> {
        let subscription = self
            .subscription_repo
            .get_by_user_id(user.id)
            .await?
            .ok_or(AppError::NotFound)?;

        let provider_subscription_id = subscription
            .provider_subscription_id
            .as_deref()
            .ok_or_else(|| {
                AppError::InvalidInput("No active provider subscription found".to_string())
            })?;

        let provider = self.provider()?;
        let confirmed = provider
            .cancel_at_period_end(provider_subscription_id)
            .await?;

        let view = SubscriptionPayload::new(&confirmed);
        let update = SubscriptionUpdate {
            status: Some(SubscriptionStatus::from_provider(
                view.status().unwrap_or("incomplete"),
            )),
            cancel_at_period_end: Some(view.cancel_at_period_end()),
            ..Default::default()
        };

        let updated = self
            .subscription_repo
            .apply_update(subscription.id, &update)
            .await?;

        info!(
            provider_subscription_id,
            "Subscription set to cancel at period end"
        );
        Ok(updated)
    }

    // ========================================================================
    // Queries & Admin Sync
    // ========================================================================

    pub async fn subscription_for_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        self.subscription_repo.get_by_user_id(user_id).await
    }

    /// Whether the user may use gated features. Staff and superusers always
    /// pass.
    pub async fn has_feature_access(&self, user: &User) -> AppResult<bool> {
        if user.bypasses_subscription_gate() {
            return Ok(true);
        }
        Ok(self
            .subscription_repo
            .get_by_user_id(user.id)
            .await?
            .is_some_and(|s| s.is_active()))
    }

    /// On-demand re-sync of one user's subscription, as invoked by the admin
    /// CLI. Every failure path carries a message suitable for an operator.
    pub async fn sync_subscription_by_email(&self, email: &str) -> AppResult<SyncReport> {
        let provider = self.provider()?;

        let user = self
            .user_repo
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::InvalidInput(format!("user with email {email} not found")))?;

        let subscription = self
            .subscription_repo
            .get_by_user_id(user.id)
            .await?
            .ok_or_else(|| {
                AppError::InvalidInput(format!("user {email} does not have a subscription"))
            })?;

        let provider_subscription_id =
            subscription.provider_subscription_id.clone().ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "subscription for {email} has no provider subscription id"
                ))
            })?;

        let previous_period_end = subscription.current_period_end;

        let payload = provider
            .retrieve_subscription(&provider_subscription_id)
            .await?;
        let updated = self.reconcile(&subscription, &payload, None).await?;

        Ok(SyncReport {
            email: email.to_string(),
            provider_subscription_id,
            status: updated.status,
            previous_period_end,
            refreshed_period_end: updated.current_period_end,
        })
    }
}

/// Drop a period whose bounds are inverted. The period columns carry a
/// `CHECK (current_period_end > current_period_start)`, so a malformed pair
/// must never reach the row update.
fn validated_period(bounds: PeriodBounds) -> PeriodBounds {
    if let (Some(start), Some(end)) = bounds
        && end <= start
    {
        warn!(start, end, "Ignoring inverted billing period from provider");
        return (None, None);
    }
    bounds
}
