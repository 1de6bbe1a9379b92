use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing::{NewSubscription, SubscriptionRepo, SubscriptionUpdate},
    domain::entities::subscription::Subscription,
};

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Subscription {
    Subscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        status: row.get("status"),
        provider_subscription_id: row.get("provider_subscription_id"),
        provider_customer_id: row.get("provider_customer_id"),
        current_period_start: row.get("current_period_start"),
        current_period_end: row.get("current_period_end"),
        cancel_at_period_end: row.get("cancel_at_period_end"),
        trial_end: row.get("trial_end"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, status, provider_subscription_id, provider_customer_id,
    current_period_start, current_period_end, cancel_at_period_end, trial_end,
    created_at, updated_at
"#;

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn get_by_provider_subscription_id(
        &self,
        provider_subscription_id: &str,
    ) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE provider_subscription_id = $1",
            SELECT_COLS
        ))
        .bind(provider_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn get_by_provider_customer_id(
        &self,
        provider_customer_id: &str,
    ) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE provider_customer_id = $1",
            SELECT_COLS
        ))
        .bind(provider_customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn create(&self, input: &NewSubscription) -> AppResult<Subscription> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions
                (id, user_id, status, provider_customer_id, provider_subscription_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(input.status)
        .bind(&input.provider_customer_id)
        .bind(&input.provider_subscription_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_subscription(&row))
    }

    async fn apply_update(
        &self,
        id: Uuid,
        update: &SubscriptionUpdate,
    ) -> AppResult<Subscription> {
        // One atomic statement; NULL parameters keep the stored value, which
        // serializes concurrent reconciliations at the row level.
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                status = COALESCE($2, status),
                provider_subscription_id = COALESCE($3, provider_subscription_id),
                current_period_start = COALESCE($4, current_period_start),
                current_period_end = COALESCE($5, current_period_end),
                trial_end = COALESCE($6, trial_end),
                cancel_at_period_end = COALESCE($7, cancel_at_period_end),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(update.status)
        .bind(&update.provider_subscription_id)
        .bind(update.current_period_start)
        .bind(update.current_period_end)
        .bind(update.trial_end)
        .bind(update.cancel_at_period_end)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_subscription(&row))
    }

    async fn set_provider_customer_id(
        &self,
        id: Uuid,
        provider_customer_id: &str,
    ) -> AppResult<Subscription> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                provider_customer_id = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(provider_customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_subscription(&row))
    }

    async fn mark_canceled(
        &self,
        id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                status = 'canceled',
                cancel_at_period_end = false,
                current_period_end = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(ended_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_subscription(&row))
    }
}
