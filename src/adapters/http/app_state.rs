use std::sync::Arc;

use crate::{
    application::use_cases::billing::{BillingUseCases, UserRepo},
    application::use_cases::storage::StorageUseCases,
    infra::config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub billing_use_cases: Arc<BillingUseCases>,
    pub storage_use_cases: Arc<StorageUseCases>,
    pub user_repo: Arc<dyn UserRepo>,
}
