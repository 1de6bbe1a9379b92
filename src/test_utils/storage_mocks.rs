//! One in-memory store implementing every storage repository trait, the same
//! shape as the Postgres adapter.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::storage::{
        PropertyInput, PropertyRepo, TenancyInput, TenancyRepo, TenantInput, TenantRepo,
        UnitInput, UnitRepo,
    },
    domain::entities::storage::{Property, StorageUnit, Tenancy, Tenant, UnitStatus},
};

#[derive(Default)]
pub struct InMemoryStorage {
    pub properties: Mutex<Vec<Property>>,
    pub units: Mutex<Vec<StorageUnit>>,
    pub tenants: Mutex<Vec<Tenant>>,
    pub tenancies: Mutex<Vec<Tenancy>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn property_ids_of_user(&self, user_id: Uuid) -> Vec<Uuid> {
        self.properties
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.id)
            .collect()
    }
}

#[async_trait]
impl PropertyRepo for InMemoryStorage {
    async fn create(&self, user_id: Uuid, input: &PropertyInput) -> AppResult<Property> {
        let property = Property {
            id: Uuid::new_v4(),
            user_id,
            name: input.name.clone(),
            address: input.address.clone(),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.properties.lock().unwrap().push(property.clone());
        Ok(property)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Property>> {
        Ok(self
            .properties
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Property>> {
        Ok(self
            .properties
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, input: &PropertyInput) -> AppResult<Property> {
        let mut properties = self.properties.lock().unwrap();
        let property = properties
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(AppError::NotFound)?;
        property.name = input.name.clone();
        property.address = input.address.clone();
        property.updated_at = Some(Utc::now());
        Ok(property.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.properties.lock().unwrap().retain(|p| p.id != id);
        self.units.lock().unwrap().retain(|u| u.property_id != id);
        Ok(())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .properties
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .count() as i64)
    }
}

#[async_trait]
impl UnitRepo for InMemoryStorage {
    async fn create(&self, input: &UnitInput) -> AppResult<StorageUnit> {
        let unit = StorageUnit {
            id: Uuid::new_v4(),
            property_id: input.property_id,
            unit_number: input.unit_number.clone(),
            size: input.size.clone(),
            status: input.status,
            monthly_rent: input.monthly_rent,
            notes: input.notes.clone(),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.units.lock().unwrap().push(unit.clone());
        Ok(unit)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<StorageUnit>> {
        Ok(self
            .units
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn list_by_property(&self, property_id: Uuid) -> AppResult<Vec<StorageUnit>> {
        Ok(self
            .units
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.property_id == property_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, input: &UnitInput) -> AppResult<StorageUnit> {
        let mut units = self.units.lock().unwrap();
        let unit = units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(AppError::NotFound)?;
        unit.property_id = input.property_id;
        unit.unit_number = input.unit_number.clone();
        unit.size = input.size.clone();
        unit.status = input.status;
        unit.monthly_rent = input.monthly_rent;
        unit.notes = input.notes.clone();
        unit.updated_at = Some(Utc::now());
        Ok(unit.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.units.lock().unwrap().retain(|u| u.id != id);
        self.tenancies.lock().unwrap().retain(|t| t.unit_id != id);
        Ok(())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        let property_ids = self.property_ids_of_user(user_id);
        Ok(self
            .units
            .lock()
            .unwrap()
            .iter()
            .filter(|u| property_ids.contains(&u.property_id))
            .count() as i64)
    }

    async fn count_by_user_and_status(
        &self,
        user_id: Uuid,
        status: UnitStatus,
    ) -> AppResult<i64> {
        let property_ids = self.property_ids_of_user(user_id);
        Ok(self
            .units
            .lock()
            .unwrap()
            .iter()
            .filter(|u| property_ids.contains(&u.property_id) && u.status == status)
            .count() as i64)
    }

    async fn rent_roll_by_user(&self, user_id: Uuid) -> AppResult<Decimal> {
        let property_ids = self.property_ids_of_user(user_id);
        Ok(self
            .units
            .lock()
            .unwrap()
            .iter()
            .filter(|u| property_ids.contains(&u.property_id) && u.status == UnitStatus::Occupied)
            .map(|u| u.monthly_rent)
            .sum())
    }
}

#[async_trait]
impl TenantRepo for InMemoryStorage {
    async fn create(&self, user_id: Uuid, input: &TenantInput) -> AppResult<Tenant> {
        let tenant = Tenant {
            id: Uuid::new_v4(),
            user_id,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email_address: input.email_address.clone(),
            phone_number: input.phone_number.clone(),
            notes: input.notes.clone(),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.tenants.lock().unwrap().push(tenant.clone());
        Ok(tenant)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Tenant>> {
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Tenant>> {
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, input: &TenantInput) -> AppResult<Tenant> {
        let mut tenants = self.tenants.lock().unwrap();
        let tenant = tenants
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(AppError::NotFound)?;
        tenant.first_name = input.first_name.clone();
        tenant.last_name = input.last_name.clone();
        tenant.email_address = input.email_address.clone();
        tenant.phone_number = input.phone_number.clone();
        tenant.notes = input.notes.clone();
        tenant.updated_at = Some(Utc::now());
        Ok(tenant.clone())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.tenants.lock().unwrap().retain(|t| t.id != id);
        self.tenancies.lock().unwrap().retain(|t| t.tenant_id != id);
        Ok(())
    }

    async fn count_by_user(&self, user_id: Uuid) -> AppResult<i64> {
        Ok(self
            .tenants
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .count() as i64)
    }
}

#[async_trait]
impl TenancyRepo for InMemoryStorage {
    async fn create(&self, input: &TenancyInput) -> AppResult<Tenancy> {
        let tenancy = Tenancy {
            id: Uuid::new_v4(),
            unit_id: input.unit_id,
            tenant_id: input.tenant_id,
            start_date: input.start_date,
            end_date: input.end_date,
            monthly_rent_at_start: input.monthly_rent_at_start,
            notes: input.notes.clone(),
            created_at: Some(Utc::now()),
        };
        self.tenancies.lock().unwrap().push(tenancy.clone());
        Ok(tenancy)
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Tenancy>> {
        Ok(self
            .tenancies
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn list_by_unit(&self, unit_id: Uuid) -> AppResult<Vec<Tenancy>> {
        Ok(self
            .tenancies
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.unit_id == unit_id)
            .cloned()
            .collect())
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Tenancy>> {
        Ok(self
            .tenancies
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.tenancies.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }
}
