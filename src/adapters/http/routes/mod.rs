pub mod billing;
pub mod storage;
pub mod webhooks;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/billing", billing::router())
        .nest("/webhooks", webhooks::router())
        .merge(storage::router())
}
