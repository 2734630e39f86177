use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::UserRole;
use crate::entities::{accommodation, booking, booking_accommodation, user};
use crate::error::{AppError, AppResult};
use crate::handlers::guest::{booking_response, BookingResponse};
use crate::AppState;

// ============ Accommodation & Rate Management ============

#[derive(Debug, Deserialize)]
pub struct CreateAccommodationRequest {
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub day_tour_rate: Decimal,
    pub overnight_rate: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccommodationRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub capacity: Option<i32>,
    pub day_tour_rate: Option<Decimal>,
    pub overnight_rate: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// List all accommodations, including inactive ones (admin)
pub async fn list_accommodations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<accommodation::Model>>> {
    let accommodations = accommodation::Entity::find()
        .order_by_asc(accommodation::Column::Name)
        .all(&state.db)
        .await?;
    Ok(Json(accommodations))
}

/// Create an accommodation (admin)
pub async fn create_accommodation(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccommodationRequest>,
) -> AppResult<Json<accommodation::Model>> {
    if payload.capacity < 1 {
        return Err(AppError::BadRequest("Capacity must be positive".to_string()));
    }
    if payload.day_tour_rate < Decimal::ZERO || payload.overnight_rate < Decimal::ZERO {
        return Err(AppError::BadRequest("Rates cannot be negative".to_string()));
    }

    let existing = accommodation::Entity::find()
        .filter(accommodation::Column::Name.eq(&payload.name))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "An accommodation with this name already exists".to_string(),
        ));
    }

    let created = accommodation::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        capacity: Set(payload.capacity),
        day_tour_rate: Set(payload.day_tour_rate),
        overnight_rate: Set(payload.overnight_rate),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok(Json(created))
}

/// Update an accommodation's details or rates (admin)
pub async fn update_accommodation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAccommodationRequest>,
) -> AppResult<Json<accommodation::Model>> {
    let existing = accommodation::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Accommodation not found".to_string()))?;

    let mut active: accommodation::ActiveModel = existing.into();

    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(capacity) = payload.capacity {
        if capacity < 1 {
            return Err(AppError::BadRequest("Capacity must be positive".to_string()));
        }
        active.capacity = Set(capacity);
    }
    if let Some(rate) = payload.day_tour_rate {
        if rate < Decimal::ZERO {
            return Err(AppError::BadRequest("Rates cannot be negative".to_string()));
        }
        active.day_tour_rate = Set(rate);
    }
    if let Some(rate) = payload.overnight_rate {
        if rate < Decimal::ZERO {
            return Err(AppError::BadRequest("Rates cannot be negative".to_string()));
        }
        active.overnight_rate = Set(rate);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let updated = active.update(&state.db).await?;
    Ok(Json(updated))
}

/// Delete an accommodation with no booking history; otherwise deactivate
/// it instead (admin)
pub async fn delete_accommodation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let existing = accommodation::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Accommodation not found".to_string()))?;

    let referenced = booking_accommodation::Entity::find()
        .filter(booking_accommodation::Column::AccommodationId.eq(id))
        .one(&state.db)
        .await?;

    if referenced.is_some() {
        return Err(AppError::Conflict(
            "Accommodation has booking history; deactivate it instead".to_string(),
        ));
    }

    let name = existing.name.clone();
    accommodation::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(serde_json::json!({
        "message": format!("Accommodation {} deleted", name)
    })))
}

// ============ User Management ============

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

/// List all users (admin)
pub async fn list_all_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = user::Entity::find().all(&state.db).await?;

    let responses: Vec<UserResponse> = users
        .into_iter()
        .map(|u| UserResponse {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            created_at: u.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

/// Update user role (admin)
pub async fn update_user_role(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.into();
    active.role = Set(payload.role.clone());
    let updated = active.update(&state.db).await?;

    Ok(Json(UserResponse {
        id: updated.id,
        email: updated.email,
        name: updated.name,
        role: updated.role,
        created_at: updated.created_at.with_timezone(&Utc),
    }))
}

/// Delete a user account (admin). Bookings survive: they keep the guest's
/// contact details and lose only the account link.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role == UserRole::Admin {
        let admins = user::Entity::find()
            .filter(user::Column::Role.eq(UserRole::Admin))
            .all(&state.db)
            .await?;
        if admins.len() <= 1 {
            return Err(AppError::Conflict(
                "Cannot delete the last admin account".to_string(),
            ));
        }
    }

    user::Entity::delete_by_id(id).exec(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

// ============ Booking oversight ============

/// List all bookings (admin)
pub async fn list_all_bookings(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let models = booking::Entity::find()
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut responses = Vec::new();
    for model in models {
        responses.push(booking_response(&state, model).await?);
    }

    Ok(Json(responses))
}
