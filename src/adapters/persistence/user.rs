use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing::UserRepo,
    domain::entities::user::User,
};

fn row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_staff: row.get("is_staff"),
        is_superuser: row.get("is_superuser"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
    }
}

const SELECT_COLS: &str =
    "id, email, first_name, last_name, is_staff, is_superuser, is_active, date_joined";

#[async_trait]
impl UserRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", SELECT_COLS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_user))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = $1",
            SELECT_COLS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_user))
    }
}
