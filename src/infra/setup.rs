use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::PostgresPersistence},
    application::{
        ports::billing_provider::BillingProviderPort,
        use_cases::{
            billing::{BillingUseCases, SubscriptionRepo, UserRepo},
            storage::{PropertyRepo, StorageUseCases, TenancyRepo, TenantRepo, UnitRepo},
        },
    },
    infra::{config::AppConfig, db::init_db, stripe_client::StripeClient},
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let pool = init_db(&config.database_url).await?;
    let postgres_arc = Arc::new(PostgresPersistence::new(pool));

    let user_repo_arc = postgres_arc.clone() as Arc<dyn UserRepo>;
    let subscription_repo_arc = postgres_arc.clone() as Arc<dyn SubscriptionRepo>;

    let provider = config
        .billing_secret_key
        .clone()
        .map(|key| Arc::new(StripeClient::new(key)) as Arc<dyn BillingProviderPort>);
    if provider.is_none() {
        tracing::warn!("BILLING_SECRET_KEY is not set; billing operations are disabled");
    }

    let billing_use_cases = BillingUseCases::new(
        user_repo_arc.clone(),
        subscription_repo_arc,
        provider,
        config.subscription_price_id.clone(),
        config.subscription_trial_days,
        config.app_origin.clone(),
    );

    let storage_use_cases = StorageUseCases::new(
        postgres_arc.clone() as Arc<dyn PropertyRepo>,
        postgres_arc.clone() as Arc<dyn UnitRepo>,
        postgres_arc.clone() as Arc<dyn TenantRepo>,
        postgres_arc as Arc<dyn TenancyRepo>,
    );

    Ok(AppState {
        config: Arc::new(config),
        billing_use_cases: Arc::new(billing_use_cases),
        storage_use_cases: Arc::new(storage_use_cases),
        user_repo: user_repo_arc,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "storehouse=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs)
    let file = File::create("app.log").expect("cannot create log file");
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
