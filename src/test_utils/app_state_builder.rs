//! Test app state builder for HTTP-level integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        ports::billing_provider::BillingProviderPort,
        use_cases::{
            billing::{BillingUseCases, SubscriptionRepo, UserRepo},
            storage::{PropertyRepo, StorageUseCases, TenancyRepo, TenantRepo, UnitRepo},
        },
    },
    domain::entities::{subscription::Subscription, user::User},
    infra::config::AppConfig,
    test_utils::{InMemoryStorage, InMemorySubscriptionRepo, InMemoryUserRepo, MockBillingProvider},
};

/// Builder for creating `AppState` backed by in-memory mocks.
///
/// The repo handles are public so tests can seed state before `build()` and
/// assert on mutations afterwards.
///
/// # Example
///
/// ```ignore
/// let user = create_test_user(|u| u.is_staff = true);
/// let app_state = TestAppStateBuilder::new().with_user(user).build();
/// ```
pub struct TestAppStateBuilder {
    pub users: Arc<InMemoryUserRepo>,
    pub subscriptions: Arc<InMemorySubscriptionRepo>,
    pub storage: Arc<InMemoryStorage>,
    provider: Option<Arc<MockBillingProvider>>,
    webhook_secret: Option<String>,
    price_id: Option<String>,
    trial_days: i64,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepo::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepo::new()),
            storage: Arc::new(InMemoryStorage::new()),
            provider: None,
            webhook_secret: None,
            price_id: None,
            trial_days: 0,
        }
    }

    pub fn with_user(self, user: User) -> Self {
        self.users.add(user);
        self
    }

    pub fn with_subscription(self, subscription: Subscription) -> Self {
        self.subscriptions.add(subscription);
        self
    }

    pub fn with_provider(mut self, provider: MockBillingProvider) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Shared handle to the scripted provider, for call assertions.
    pub fn provider_handle(&self) -> Option<Arc<MockBillingProvider>> {
        self.provider.clone()
    }

    pub fn with_webhook_secret(mut self, secret: &str) -> Self {
        self.webhook_secret = Some(secret.to_string());
        self
    }

    pub fn with_price_id(mut self, price_id: &str) -> Self {
        self.price_id = Some(price_id.to_string());
        self
    }

    pub fn with_trial_days(mut self, days: i64) -> Self {
        self.trial_days = days;
        self
    }

    pub fn build(self) -> AppState {
        let user_repo = self.users.clone() as Arc<dyn UserRepo>;
        let subscription_repo = self.subscriptions.clone() as Arc<dyn SubscriptionRepo>;
        let provider = self
            .provider
            .map(|p| p as Arc<dyn BillingProviderPort>);

        let billing_use_cases = BillingUseCases::new(
            user_repo.clone(),
            subscription_repo,
            provider,
            self.price_id.clone(),
            self.trial_days,
            "http://localhost:3000".to_string(),
        );

        let storage_use_cases = StorageUseCases::new(
            self.storage.clone() as Arc<dyn PropertyRepo>,
            self.storage.clone() as Arc<dyn UnitRepo>,
            self.storage.clone() as Arc<dyn TenantRepo>,
            self.storage as Arc<dyn TenancyRepo>,
        );

        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
            database_url: String::new(),
            app_origin: "http://localhost:3000".to_string(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            billing_secret_key: None,
            billing_webhook_secret: self.webhook_secret,
            subscription_price_id: self.price_id,
            billing_publishable_key: None,
            subscription_trial_days: self.trial_days,
        });

        AppState {
            config,
            billing_use_cases: Arc::new(billing_use_cases),
            storage_use_cases: Arc::new(storage_use_cases),
            user_repo,
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
