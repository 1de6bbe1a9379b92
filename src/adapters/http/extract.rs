//! Request extractors.
//!
//! Session handling lives in the fronting proxy, which forwards the
//! authenticated account id in `x-user-id`. This extractor resolves that id
//! into a loaded [`User`].

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppError,
    domain::entities::user::User,
};

pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                AppError::InvalidInput("Missing or invalid x-user-id header".to_string())
            })?;

        let user = state
            .user_repo
            .get_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::NotFound)?;

        Ok(CurrentUser(user))
    }
}
