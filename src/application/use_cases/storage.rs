//! CRUD use cases over the storage portfolio: properties, units, tenants and
//! tenancies, plus the dashboard summary.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::storage::{Property, StorageUnit, Tenancy, Tenant, UnitStatus};

// ============================================================================
// Repository Traits
// ============================================================================

#[derive(Debug, Clone)]
pub struct PropertyInput {
    pub name: String,
    pub address: String,
}

#[async_trait]
pub trait PropertyRepo: Send + Sync {
    async fn create(&self, user_id: Uuid, input: &PropertyInput) -> AppResult<Property>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Property>>;
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Property>>;
    async fn update(&self, id: Uuid, input: &PropertyInput) -> AppResult<Property>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64>;
}

#[derive(Debug, Clone)]
pub struct UnitInput {
    pub property_id: Uuid,
    pub unit_number: String,
    pub size: String,
    pub status: UnitStatus,
    pub monthly_rent: Decimal,
    pub notes: String,
}

#[async_trait]
pub trait UnitRepo: Send + Sync {
    async fn create(&self, input: &UnitInput) -> AppResult<StorageUnit>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<StorageUnit>>;
    async fn list_by_property(&self, property_id: Uuid) -> AppResult<Vec<StorageUnit>>;
    async fn update(&self, id: Uuid, input: &UnitInput) -> AppResult<StorageUnit>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64>;
    async fn count_by_user_and_status(&self, user_id: Uuid, status: UnitStatus)
    -> AppResult<i64>;
    async fn rent_roll_by_user(&self, user_id: Uuid) -> AppResult<Decimal>;
}

#[derive(Debug, Clone)]
pub struct TenantInput {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub phone_number: String,
    pub notes: String,
}

#[async_trait]
pub trait TenantRepo: Send + Sync {
    async fn create(&self, user_id: Uuid, input: &TenantInput) -> AppResult<Tenant>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Tenant>>;
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Tenant>>;
    async fn update(&self, id: Uuid, input: &TenantInput) -> AppResult<Tenant>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64>;
}

#[derive(Debug, Clone)]
pub struct TenancyInput {
    pub unit_id: Uuid,
    pub tenant_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub monthly_rent_at_start: Decimal,
    pub notes: String,
}

#[async_trait]
pub trait TenancyRepo: Send + Sync {
    async fn create(&self, input: &TenancyInput) -> AppResult<Tenancy>;
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Tenancy>>;
    async fn list_by_unit(&self, unit_id: Uuid) -> AppResult<Vec<Tenancy>>;
    async fn list_by_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Tenancy>>;
    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub property_count: i64,
    pub unit_count: i64,
    pub occupied_unit_count: i64,
    pub tenant_count: i64,
    pub monthly_rent_roll: Decimal,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct StorageUseCases {
    property_repo: Arc<dyn PropertyRepo>,
    unit_repo: Arc<dyn UnitRepo>,
    tenant_repo: Arc<dyn TenantRepo>,
    tenancy_repo: Arc<dyn TenancyRepo>,
}

impl StorageUseCases {
    pub fn new(
        property_repo: Arc<dyn PropertyRepo>,
        unit_repo: Arc<dyn UnitRepo>,
        tenant_repo: Arc<dyn TenantRepo>,
        tenancy_repo: Arc<dyn TenancyRepo>,
    ) -> Self {
        Self {
            property_repo,
            unit_repo,
            tenant_repo,
            tenancy_repo,
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    pub async fn create_property(
        &self,
        user_id: Uuid,
        input: &PropertyInput,
    ) -> AppResult<Property> {
        if input.name.trim().is_empty() {
            return Err(AppError::InvalidInput("property name is required".into()));
        }
        self.property_repo.create(user_id, input).await
    }

    pub async fn list_properties(&self, user_id: Uuid) -> AppResult<Vec<Property>> {
        self.property_repo.list_by_user(user_id).await
    }

    pub async fn get_property(&self, id: Uuid, user_id: Uuid) -> AppResult<Property> {
        let property = self
            .property_repo
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;
        if property.user_id != user_id {
            return Err(AppError::NotFound);
        }
        Ok(property)
    }

    pub async fn update_property(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: &PropertyInput,
    ) -> AppResult<Property> {
        self.get_property(id, user_id).await?;
        self.property_repo.update(id, input).await
    }

    pub async fn delete_property(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.get_property(id, user_id).await?;
        self.property_repo.delete(id).await
    }

    // ========================================================================
    // Units
    // ========================================================================

    pub async fn create_unit(&self, user_id: Uuid, input: &UnitInput) -> AppResult<StorageUnit> {
        // The unit must belong to one of the caller's properties.
        self.get_property(input.property_id, user_id).await?;
        self.unit_repo.create(input).await
    }

    pub async fn list_units(&self, property_id: Uuid, user_id: Uuid) -> AppResult<Vec<StorageUnit>> {
        self.get_property(property_id, user_id).await?;
        self.unit_repo.list_by_property(property_id).await
    }

    pub async fn get_unit(&self, id: Uuid, user_id: Uuid) -> AppResult<StorageUnit> {
        let unit = self.unit_repo.get_by_id(id).await?.ok_or(AppError::NotFound)?;
        self.get_property(unit.property_id, user_id).await?;
        Ok(unit)
    }

    pub async fn update_unit(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: &UnitInput,
    ) -> AppResult<StorageUnit> {
        self.get_unit(id, user_id).await?;
        self.get_property(input.property_id, user_id).await?;
        self.unit_repo.update(id, input).await
    }

    pub async fn delete_unit(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.get_unit(id, user_id).await?;
        self.unit_repo.delete(id).await
    }

    // ========================================================================
    // Tenants
    // ========================================================================

    pub async fn create_tenant(&self, user_id: Uuid, input: &TenantInput) -> AppResult<Tenant> {
        self.tenant_repo.create(user_id, input).await
    }

    pub async fn list_tenants(&self, user_id: Uuid) -> AppResult<Vec<Tenant>> {
        self.tenant_repo.list_by_user(user_id).await
    }

    pub async fn get_tenant(&self, id: Uuid, user_id: Uuid) -> AppResult<Tenant> {
        let tenant = self
            .tenant_repo
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;
        if tenant.user_id != user_id {
            return Err(AppError::NotFound);
        }
        Ok(tenant)
    }

    pub async fn update_tenant(
        &self,
        id: Uuid,
        user_id: Uuid,
        input: &TenantInput,
    ) -> AppResult<Tenant> {
        self.get_tenant(id, user_id).await?;
        self.tenant_repo.update(id, input).await
    }

    pub async fn delete_tenant(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.get_tenant(id, user_id).await?;
        self.tenant_repo.delete(id).await
    }

    // ========================================================================
    // Tenancies
    // ========================================================================

    pub async fn create_tenancy(&self, user_id: Uuid, input: &TenancyInput) -> AppResult<Tenancy> {
        if input.end_date <= input.start_date {
            return Err(AppError::InvalidInput(
                "tenancy end date must be after start date".into(),
            ));
        }
        self.get_unit(input.unit_id, user_id).await?;
        self.get_tenant(input.tenant_id, user_id).await?;
        self.tenancy_repo.create(input).await
    }

    pub async fn list_tenancies_for_unit(
        &self,
        unit_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<Tenancy>> {
        self.get_unit(unit_id, user_id).await?;
        self.tenancy_repo.list_by_unit(unit_id).await
    }

    pub async fn list_tenancies_for_tenant(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<Tenancy>> {
        self.get_tenant(tenant_id, user_id).await?;
        self.tenancy_repo.list_by_tenant(tenant_id).await
    }

    pub async fn delete_tenancy(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let tenancy = self
            .tenancy_repo
            .get_by_id(id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.get_unit(tenancy.unit_id, user_id).await?;
        self.tenancy_repo.delete(id).await
    }

    // ========================================================================
    // Dashboard
    // ========================================================================

    pub async fn dashboard_summary(&self, user_id: Uuid) -> AppResult<DashboardSummary> {
        Ok(DashboardSummary {
            property_count: self.property_repo.count_by_user(user_id).await?,
            unit_count: self.unit_repo.count_by_user(user_id).await?,
            occupied_unit_count: self
                .unit_repo
                .count_by_user_and_status(user_id, UnitStatus::Occupied)
                .await?,
            tenant_count: self.tenant_repo.count_by_user(user_id).await?,
            monthly_rent_roll: self.unit_repo.rent_roll_by_user(user_id).await?,
        })
    }
}
