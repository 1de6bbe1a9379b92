//! Storage portfolio endpoints: properties, units, tenants, tenancies and the
//! dashboard summary. Everything here sits behind the subscription gate.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, extract::CurrentUser},
    app_error::{AppError, AppResult},
    application::use_cases::storage::{PropertyInput, TenancyInput, TenantInput, UnitInput},
    domain::entities::{storage::UnitStatus, user::User},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/properties", get(list_properties).post(create_property))
        .route(
            "/properties/{id}",
            get(get_property).put(update_property).delete(delete_property),
        )
        .route("/properties/{id}/units", get(list_units).post(create_unit))
        .route(
            "/units/{id}",
            get(get_unit).put(update_unit).delete(delete_unit),
        )
        .route(
            "/units/{id}/tenancies",
            get(list_tenancies).post(create_tenancy),
        )
        .route("/tenancies/{id}", delete(delete_tenancy))
        .route("/tenants", get(list_tenants).post(create_tenant))
        .route(
            "/tenants/{id}",
            get(get_tenant).put(update_tenant).delete(delete_tenant),
        )
        .route("/tenants/{id}/tenancies", get(list_tenant_tenancies))
}

async fn require_access(app_state: &AppState, user: &User) -> AppResult<()> {
    if app_state.billing_use_cases.has_feature_access(user).await? {
        Ok(())
    } else {
        Err(AppError::SubscriptionRequired)
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// GET /dashboard
async fn get_dashboard(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let summary = app_state.storage_use_cases.dashboard_summary(user.id).await?;
    Ok(Json(summary))
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Deserialize)]
struct PropertyBody {
    name: String,
    #[serde(default)]
    address: String,
}

impl From<PropertyBody> for PropertyInput {
    fn from(body: PropertyBody) -> Self {
        Self {
            name: body.name,
            address: body.address,
        }
    }
}

async fn list_properties(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let properties = app_state.storage_use_cases.list_properties(user.id).await?;
    Ok(Json(properties))
}

async fn create_property(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<PropertyBody>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let property = app_state
        .storage_use_cases
        .create_property(user.id, &body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(property)))
}

async fn get_property(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let property = app_state.storage_use_cases.get_property(id, user.id).await?;
    Ok(Json(property))
}

async fn update_property(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PropertyBody>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let property = app_state
        .storage_use_cases
        .update_property(id, user.id, &body.into())
        .await?;
    Ok(Json(property))
}

async fn delete_property(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_access(&app_state, &user).await?;
    app_state
        .storage_use_cases
        .delete_property(id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Units
// ============================================================================

#[derive(Deserialize)]
struct UnitBody {
    unit_number: String,
    #[serde(default)]
    size: String,
    status: UnitStatus,
    monthly_rent: Decimal,
    #[serde(default)]
    notes: String,
}

impl UnitBody {
    fn into_input(self, property_id: Uuid) -> UnitInput {
        UnitInput {
            property_id,
            unit_number: self.unit_number,
            size: self.size,
            status: self.status,
            monthly_rent: self.monthly_rent,
            notes: self.notes,
        }
    }
}

async fn list_units(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(property_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let units = app_state
        .storage_use_cases
        .list_units(property_id, user.id)
        .await?;
    Ok(Json(units))
}

async fn create_unit(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(property_id): Path<Uuid>,
    Json(body): Json<UnitBody>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let unit = app_state
        .storage_use_cases
        .create_unit(user.id, &body.into_input(property_id))
        .await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

async fn get_unit(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let unit = app_state.storage_use_cases.get_unit(id, user.id).await?;
    Ok(Json(unit))
}

/// Updates carry the owning property id in the body so a unit can be moved
/// between the caller's properties.
#[derive(Deserialize)]
struct UnitUpdateBody {
    property_id: Uuid,
    #[serde(flatten)]
    unit: UnitBody,
}

async fn update_unit(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UnitUpdateBody>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let input = body.unit.into_input(body.property_id);
    let unit = app_state
        .storage_use_cases
        .update_unit(id, user.id, &input)
        .await?;
    Ok(Json(unit))
}

async fn delete_unit(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_access(&app_state, &user).await?;
    app_state.storage_use_cases.delete_unit(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Tenants
// ============================================================================

#[derive(Deserialize)]
struct TenantBody {
    first_name: String,
    last_name: String,
    #[serde(default)]
    email_address: String,
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    notes: String,
}

impl From<TenantBody> for TenantInput {
    fn from(body: TenantBody) -> Self {
        Self {
            first_name: body.first_name,
            last_name: body.last_name,
            email_address: body.email_address,
            phone_number: body.phone_number,
            notes: body.notes,
        }
    }
}

async fn list_tenants(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let tenants = app_state.storage_use_cases.list_tenants(user.id).await?;
    Ok(Json(tenants))
}

async fn create_tenant(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<TenantBody>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let tenant = app_state
        .storage_use_cases
        .create_tenant(user.id, &body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

async fn get_tenant(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let tenant = app_state.storage_use_cases.get_tenant(id, user.id).await?;
    Ok(Json(tenant))
}

async fn update_tenant(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<TenantBody>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let tenant = app_state
        .storage_use_cases
        .update_tenant(id, user.id, &body.into())
        .await?;
    Ok(Json(tenant))
}

async fn delete_tenant(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_access(&app_state, &user).await?;
    app_state
        .storage_use_cases
        .delete_tenant(id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Tenancies
// ============================================================================

#[derive(Deserialize)]
struct TenancyBody {
    tenant_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    monthly_rent_at_start: Decimal,
    #[serde(default)]
    notes: String,
}

async fn list_tenancies(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(unit_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let tenancies = app_state
        .storage_use_cases
        .list_tenancies_for_unit(unit_id, user.id)
        .await?;
    Ok(Json(tenancies))
}

async fn create_tenancy(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(unit_id): Path<Uuid>,
    Json(body): Json<TenancyBody>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let input = TenancyInput {
        unit_id,
        tenant_id: body.tenant_id,
        start_date: body.start_date,
        end_date: body.end_date,
        monthly_rent_at_start: body.monthly_rent_at_start,
        notes: body.notes,
    };
    let tenancy = app_state
        .storage_use_cases
        .create_tenancy(user.id, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(tenancy)))
}

async fn list_tenant_tenancies(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(tenant_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    require_access(&app_state, &user).await?;
    let tenancies = app_state
        .storage_use_cases
        .list_tenancies_for_tenant(tenant_id, user.id)
        .await?;
    Ok(Json(tenancies))
}

async fn delete_tenancy(
    State(app_state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    require_access(&app_state, &user).await?;
    app_state
        .storage_use_cases
        .delete_tenancy(id, user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
