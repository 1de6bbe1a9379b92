use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::storage::{
        PropertyInput, PropertyRepo, TenancyInput, TenancyRepo, TenantInput, TenantRepo,
        UnitInput, UnitRepo,
    },
    domain::entities::storage::{Property, StorageUnit, Tenancy, Tenant, UnitStatus},
};

// ============================================================================
// Properties
// ============================================================================

fn row_to_property(row: &sqlx::postgres::PgRow) -> Property {
    Property {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        address: row.get("address"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const PROPERTY_COLS: &str = "id, user_id, name, address, created_at, updated_at";

#[async_trait]
impl PropertyRepo for PostgresPersistence {
    async fn create(&self, user_id: Uuid, input: &PropertyInput) -> AppResult<Property> {
        let row = sqlx::query(&format!(
            "INSERT INTO properties (id, user_id, name, address) VALUES ($1, $2, $3, $4) RETURNING {}",
            PROPERTY_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.name)
        .bind(&input.address)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_property(&row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Property>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM properties WHERE id = $1",
            PROPERTY_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_property))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Property>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM properties WHERE user_id = $1 ORDER BY created_at DESC",
            PROPERTY_COLS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_property).collect())
    }

    async fn update(&self, id: Uuid, input: &PropertyInput) -> AppResult<Property> {
        let row = sqlx::query(&format!(
            "UPDATE properties SET name = $2, address = $3, updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING {}",
            PROPERTY_COLS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.address)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_property(&row))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM properties WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(count)
    }
}

// ============================================================================
// Units
// ============================================================================

fn row_to_unit(row: &sqlx::postgres::PgRow) -> StorageUnit {
    StorageUnit {
        id: row.get("id"),
        property_id: row.get("property_id"),
        unit_number: row.get("unit_number"),
        size: row.get("size"),
        status: row.get("status"),
        monthly_rent: row.get("monthly_rent"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const UNIT_COLS: &str =
    "id, property_id, unit_number, size, status, monthly_rent, notes, created_at, updated_at";

#[async_trait]
impl UnitRepo for PostgresPersistence {
    async fn create(&self, input: &UnitInput) -> AppResult<StorageUnit> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO units (id, property_id, unit_number, size, status, monthly_rent, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            UNIT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(input.property_id)
        .bind(&input.unit_number)
        .bind(&input.size)
        .bind(input.status)
        .bind(input.monthly_rent)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_unit(&row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<StorageUnit>> {
        let row = sqlx::query(&format!("SELECT {} FROM units WHERE id = $1", UNIT_COLS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_unit))
    }

    async fn list_by_property(&self, property_id: Uuid) -> AppResult<Vec<StorageUnit>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM units WHERE property_id = $1 ORDER BY unit_number",
            UNIT_COLS
        ))
        .bind(property_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_unit).collect())
    }

    async fn update(&self, id: Uuid, input: &UnitInput) -> AppResult<StorageUnit> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE units SET
                property_id = $2,
                unit_number = $3,
                size = $4,
                status = $5,
                monthly_rent = $6,
                notes = $7,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            UNIT_COLS
        ))
        .bind(id)
        .bind(input.property_id)
        .bind(&input.unit_number)
        .bind(&input.size)
        .bind(input.status)
        .bind(input.monthly_rent)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_unit(&row))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM units WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM units u
            JOIN properties p ON u.property_id = p.id
            WHERE p.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(count)
    }

    async fn count_by_user_and_status(
        &self,
        user_id: Uuid,
        status: UnitStatus,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM units u
            JOIN properties p ON u.property_id = p.id
            WHERE p.user_id = $1 AND u.status = $2
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(count)
    }

    async fn rent_roll_by_user(&self, user_id: Uuid) -> AppResult<Decimal> {
        let total: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(u.monthly_rent) FROM units u
            JOIN properties p ON u.property_id = p.id
            WHERE p.user_id = $1 AND u.status = 'occupied'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(total.unwrap_or_default())
    }
}

// ============================================================================
// Tenants
// ============================================================================

fn row_to_tenant(row: &sqlx::postgres::PgRow) -> Tenant {
    Tenant {
        id: row.get("id"),
        user_id: row.get("user_id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email_address: row.get("email_address"),
        phone_number: row.get("phone_number"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const TENANT_COLS: &str =
    "id, user_id, first_name, last_name, email_address, phone_number, notes, created_at, updated_at";

#[async_trait]
impl TenantRepo for PostgresPersistence {
    async fn create(&self, user_id: Uuid, input: &TenantInput) -> AppResult<Tenant> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tenants (id, user_id, first_name, last_name, email_address, phone_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TENANT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email_address)
        .bind(&input.phone_number)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_tenant(&row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Tenant>> {
        let row = sqlx::query(&format!("SELECT {} FROM tenants WHERE id = $1", TENANT_COLS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_tenant))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Tenant>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tenants WHERE user_id = $1 ORDER BY last_name, first_name",
            TENANT_COLS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_tenant).collect())
    }

    async fn update(&self, id: Uuid, input: &TenantInput) -> AppResult<Tenant> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE tenants SET
                first_name = $2,
                last_name = $3,
                email_address = $4,
                phone_number = $5,
                notes = $6,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            TENANT_COLS
        ))
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email_address)
        .bind(&input.phone_number)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_tenant(&row))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tenants WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(count)
    }
}

// ============================================================================
// Tenancies
// ============================================================================

fn row_to_tenancy(row: &sqlx::postgres::PgRow) -> Tenancy {
    Tenancy {
        id: row.get("id"),
        unit_id: row.get("unit_id"),
        tenant_id: row.get("tenant_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        monthly_rent_at_start: row.get("monthly_rent_at_start"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}

const TENANCY_COLS: &str =
    "id, unit_id, tenant_id, start_date, end_date, monthly_rent_at_start, notes, created_at";

#[async_trait]
impl TenancyRepo for PostgresPersistence {
    async fn create(&self, input: &TenancyInput) -> AppResult<Tenancy> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tenancies (id, unit_id, tenant_id, start_date, end_date, monthly_rent_at_start, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            TENANCY_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(input.unit_id)
        .bind(input.tenant_id)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.monthly_rent_at_start)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_tenancy(&row))
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Tenancy>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tenancies WHERE id = $1",
            TENANCY_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_tenancy))
    }

    async fn list_by_unit(&self, unit_id: Uuid) -> AppResult<Vec<Tenancy>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tenancies WHERE unit_id = $1 ORDER BY start_date DESC",
            TENANCY_COLS
        ))
        .bind(unit_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_tenancy).collect())
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Tenancy>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tenancies WHERE tenant_id = $1 ORDER BY start_date DESC",
            TENANCY_COLS
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_tenancy).collect())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM tenancies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
