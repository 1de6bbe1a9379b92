//! In-memory mocks for the billing-side repository traits and the provider
//! port.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_provider::{BillingProviderPort, CheckoutSessionParams},
    application::use_cases::billing::{
        NewSubscription, SubscriptionRepo, SubscriptionUpdate, UserRepo,
    },
    domain::entities::{subscription::Subscription, user::User},
};

// ============================================================================
// InMemoryUserRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserRepo {
    pub users: Mutex<Vec<User>>,
}

impl InMemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }
}

#[async_trait]
impl UserRepo for InMemoryUserRepo {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }
}

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, subscription: Subscription) {
        self.subscriptions.lock().unwrap().push(subscription);
    }

    pub fn all(&self) -> Vec<Subscription> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn find_by_user_id(&self, user_id: Uuid) -> Option<Subscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == user_id)
            .cloned()
    }

    pub fn find_by_provider_subscription_id(&self, id: &str) -> Option<Subscription> {
        self.subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.provider_subscription_id.as_deref() == Some(id))
            .cloned()
    }

    fn mutate(
        &self,
        id: Uuid,
        mutate: impl FnOnce(&mut Subscription),
    ) -> AppResult<Subscription> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let subscription = subscriptions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(AppError::NotFound)?;
        mutate(subscription);
        subscription.updated_at = Some(Utc::now());
        Ok(subscription.clone())
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self.find_by_user_id(user_id))
    }

    async fn get_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> AppResult<Option<Subscription>> {
        Ok(self.find_by_provider_subscription_id(provider_subscription_id))
    }

    async fn get_by_provider_customer_id(
        &self,
        provider_customer_id: &str,
    ) -> AppResult<Option<Subscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.provider_customer_id.as_deref() == Some(provider_customer_id))
            .cloned())
    }

    async fn create(&self, input: &NewSubscription) -> AppResult<Subscription> {
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            status: input.status,
            provider_subscription_id: input.provider_subscription_id.clone(),
            provider_customer_id: input.provider_customer_id.clone(),
            current_period_start: None,
            current_period_end: None,
            cancel_at_period_end: false,
            trial_end: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.subscriptions.lock().unwrap().push(subscription.clone());
        Ok(subscription)
    }

    async fn apply_update(
        &self,
        id: Uuid,
        update: &SubscriptionUpdate,
    ) -> AppResult<Subscription> {
        self.mutate(id, |s| {
            if let Some(status) = update.status {
                s.status = status;
            }
            if let Some(sub_id) = &update.provider_subscription_id {
                s.provider_subscription_id = Some(sub_id.clone());
            }
            if let Some(start) = update.current_period_start {
                s.current_period_start = Some(start);
            }
            if let Some(end) = update.current_period_end {
                s.current_period_end = Some(end);
            }
            if let Some(trial_end) = update.trial_end {
                s.trial_end = Some(trial_end);
            }
            if let Some(flag) = update.cancel_at_period_end {
                s.cancel_at_period_end = flag;
            }
        })
    }

    async fn set_provider_customer_id(
        &self,
        id: Uuid,
        provider_customer_id: &str,
    ) -> AppResult<Subscription> {
        self.mutate(id, |s| {
            s.provider_customer_id = Some(provider_customer_id.to_string());
        })
    }

    async fn mark_canceled(&self, id: Uuid, ended_at: DateTime<Utc>) -> AppResult<Subscription> {
        self.mutate(id, |s| {
            s.status = crate::domain::entities::subscription::SubscriptionStatus::Canceled;
            s.cancel_at_period_end = false;
            s.current_period_end = Some(ended_at);
        })
    }
}

// ============================================================================
// MockBillingProvider
// ============================================================================

/// Scriptable provider mock. Subscriptions, customers and the checkout
/// session response are seeded up front; every call is recorded for
/// assertions.
#[derive(Default)]
pub struct MockBillingProvider {
    subscriptions: Mutex<HashMap<String, JsonValue>>,
    customers: Mutex<HashMap<String, JsonValue>>,
    checkout_session: Mutex<Option<JsonValue>>,
    fail_retrieve_subscription: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscription(self, id: &str, payload: JsonValue) -> Self {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(id.to_string(), payload);
        self
    }

    pub fn with_customer(self, id: &str, payload: JsonValue) -> Self {
        self.customers
            .lock()
            .unwrap()
            .insert(id.to_string(), payload);
        self
    }

    pub fn with_checkout_session(self, payload: JsonValue) -> Self {
        *self.checkout_session.lock().unwrap() = Some(payload);
        self
    }

    /// Make every subscription re-fetch fail, to exercise the embedded
    /// payload fallback.
    pub fn failing_retrieve(mut self) -> Self {
        self.fail_retrieve_subscription = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BillingProviderPort for MockBillingProvider {
    async fn retrieve_subscription(&self, subscription_id: &str) -> AppResult<JsonValue> {
        self.record(format!("retrieve_subscription:{subscription_id}"));
        if self.fail_retrieve_subscription {
            return Err(AppError::Provider("simulated provider outage".into()));
        }
        self.subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| AppError::Provider(format!("no such subscription: {subscription_id}")))
    }

    async fn cancel_at_period_end(&self, subscription_id: &str) -> AppResult<JsonValue> {
        self.record(format!("cancel_at_period_end:{subscription_id}"));
        self.subscriptions
            .lock()
            .unwrap()
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| AppError::Provider(format!("no such subscription: {subscription_id}")))
    }

    async fn retrieve_customer(&self, customer_id: &str) -> AppResult<JsonValue> {
        self.record(format!("retrieve_customer:{customer_id}"));
        self.customers
            .lock()
            .unwrap()
            .get(customer_id)
            .cloned()
            .ok_or_else(|| AppError::Provider(format!("no such customer: {customer_id}")))
    }

    async fn create_customer(
        &self,
        email: &str,
        metadata: HashMap<String, String>,
    ) -> AppResult<JsonValue> {
        self.record(format!("create_customer:{email}"));
        let id = format!("cus_test_{}", self.customers.lock().unwrap().len() + 1);
        let payload = json!({
            "id": id,
            "email": email,
            "metadata": metadata,
        });
        self.customers
            .lock()
            .unwrap()
            .insert(id.clone(), payload.clone());
        Ok(payload)
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> AppResult<JsonValue> {
        self.record(format!("create_checkout_session:{}", params.price_id));
        self.checkout_session
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::Provider("no checkout session scripted".into()))
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> AppResult<JsonValue> {
        self.record(format!("retrieve_checkout_session:{session_id}"));
        self.checkout_session
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AppError::Provider("no checkout session scripted".into()))
    }
}
