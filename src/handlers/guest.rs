use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{BookingChannel, BookingStatus, RentalCategory};
use crate::entities::{accommodation, booking, booking_accommodation};
use crate::error::{AppError, AppResult};
use crate::services::availability::{self, conflict_message, Conflict};
use crate::services::bookings::{self, AccommodationRequest, EntranceRates, NewBooking};
use crate::services::rebookings::{self, NewRebooking};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AccommodationInfo {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
    pub day_tour_rate: Decimal,
    pub overnight_rate: Decimal,
}

/// List accommodations open for booking
pub async fn list_accommodations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<AccommodationInfo>>> {
    let accommodations = accommodation::Entity::find()
        .filter(accommodation::Column::IsActive.eq(true))
        .order_by_asc(accommodation::Column::Name)
        .all(&state.db)
        .await?;

    let responses = accommodations
        .into_iter()
        .map(|a| AccommodationInfo {
            id: a.id,
            name: a.name,
            description: a.description,
            capacity: a.capacity,
            day_tour_rate: a.day_tour_rate,
            overnight_rate: a.overnight_rate,
        })
        .collect();

    Ok(Json(responses))
}

/// Get accommodation details
pub async fn get_accommodation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AccommodationInfo>> {
    let a = accommodation::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .filter(|a| a.is_active)
        .ok_or_else(|| AppError::NotFound("Accommodation not found".to_string()))?;

    Ok(Json(AccommodationInfo {
        id: a.id,
        name: a.name,
        description: a.description,
        capacity: a.capacity,
        day_tour_rate: a.day_tour_rate,
        overnight_rate: a.overnight_rate,
    }))
}

// ============ Availability ============

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub accommodation_ids: Vec<i32>,
    pub check_in_date: NaiveDate,
    pub check_out_date: Option<NaiveDate>,
    pub exclude_booking_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ConflictInfo {
    #[serde(flatten)]
    pub conflict: Conflict,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    pub conflicts: Vec<ConflictInfo>,
}

/// Check whether a set of accommodations is free for a date range
pub async fn check_availability(
    State(state): State<AppState>,
    Json(payload): Json<AvailabilityRequest>,
) -> AppResult<Json<AvailabilityResponse>> {
    let conflicts = availability::check_availability(
        &state.db,
        &payload.accommodation_ids,
        payload.check_in_date,
        payload.check_out_date,
        payload.exclude_booking_id,
    )
    .await?;

    let conflicts: Vec<ConflictInfo> = conflicts
        .into_iter()
        .map(|c| {
            let message = conflict_message(&c);
            ConflictInfo {
                conflict: c,
                message,
            }
        })
        .collect();

    Ok(Json(AvailabilityResponse {
        available: conflicts.is_empty(),
        conflicts,
    }))
}

// ============ Guest bookings ============

#[derive(Debug, Deserialize)]
pub struct AccommodationSelection {
    pub accommodation_id: i32,
    pub guest_count: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub category: RentalCategory,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: Option<NaiveDate>,
    pub adults: i32,
    pub children: i32,
    pub accommodations: Vec<AccommodationSelection>,
}

#[derive(Debug, Serialize)]
pub struct BookedAccommodationInfo {
    pub accommodation_id: i32,
    pub name: String,
    pub guest_count: i32,
    pub rate: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_number: String,
    pub channel: BookingChannel,
    pub category: RentalCategory,
    pub guest_name: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: Option<NaiveDate>,
    pub adults: i32,
    pub children: i32,
    pub total_guests: i32,
    pub accommodation_subtotal: Decimal,
    pub entrance_fee_subtotal: Decimal,
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Decimal,
    pub is_fully_paid: bool,
    pub status: BookingStatus,
    pub accommodations: Vec<BookedAccommodationInfo>,
}

pub(crate) async fn booking_response(
    state: &AppState,
    model: booking::Model,
) -> AppResult<BookingResponse> {
    let line_items = booking_accommodation::Entity::find()
        .filter(booking_accommodation::Column::BookingId.eq(model.id))
        .all(&state.db)
        .await?;
    let accommodations = accommodation::Entity::find().all(&state.db).await?;

    let booked = line_items
        .into_iter()
        .map(|item| {
            let name = accommodations
                .iter()
                .find(|a| a.id == item.accommodation_id)
                .map(|a| a.name.clone())
                .unwrap_or_default();
            BookedAccommodationInfo {
                accommodation_id: item.accommodation_id,
                name,
                guest_count: item.guest_count,
                rate: item.rate,
                subtotal: item.subtotal,
            }
        })
        .collect();

    Ok(BookingResponse {
        id: model.id,
        booking_number: model.booking_number.clone(),
        channel: model.channel.clone(),
        category: model.category.clone(),
        guest_name: model.guest_name.clone(),
        check_in_date: model.check_in_date,
        check_out_date: model.check_out_date,
        adults: model.adults,
        children: model.children,
        total_guests: model.total_guests(),
        accommodation_subtotal: model.accommodation_subtotal,
        entrance_fee_subtotal: model.entrance_fee_subtotal,
        total_amount: model.total_amount,
        paid_amount: model.paid_amount,
        balance: model.balance(),
        is_fully_paid: model.is_fully_paid(),
        status: model.status,
        accommodations: booked,
    })
}

/// Create a booking for the logged-in guest
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    let input = NewBooking {
        channel: BookingChannel::Registered,
        category: payload.category,
        guest_name: payload.guest_name,
        guest_email: payload.guest_email,
        guest_phone: payload.guest_phone,
        user_id: Some(claims.sub),
        check_in_date: payload.check_in_date,
        check_out_date: payload.check_out_date,
        adults: payload.adults,
        children: payload.children,
        accommodations: payload
            .accommodations
            .into_iter()
            .map(|a| AccommodationRequest {
                accommodation_id: a.accommodation_id,
                guest_count: a.guest_count,
            })
            .collect(),
        downpayment_required: false,
        downpayment_amount: None,
    };

    let rates = EntranceRates {
        adult: state.config.adult_entrance_fee,
        child: state.config.child_entrance_fee,
    };

    let created = bookings::create_booking(&state.db, rates, input, None).await?;
    Ok(Json(booking_response(&state, created).await?))
}

/// List the logged-in guest's bookings
pub async fn my_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let models = booking::Entity::find()
        .filter(booking::Column::UserId.eq(claims.sub))
        .order_by_desc(booking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut responses = Vec::new();
    for model in models {
        responses.push(booking_response(&state, model).await?);
    }

    Ok(Json(responses))
}

/// Get one of the logged-in guest's bookings
pub async fn my_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let model = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if model.user_id != Some(claims.sub) {
        return Err(AppError::Forbidden(
            "You can only view your own bookings".to_string(),
        ));
    }

    Ok(Json(booking_response(&state, model).await?))
}

// ============ Rebooking requests ============

#[derive(Debug, Deserialize)]
pub struct RequestRebookingRequest {
    pub new_check_in_date: NaiveDate,
    pub new_check_out_date: Option<NaiveDate>,
    pub new_adults: i32,
    pub new_children: i32,
    pub accommodations: Vec<AccommodationSelection>,
}

#[derive(Debug, Serialize)]
pub struct RebookingInfo {
    pub id: Uuid,
    pub rebooking_number: String,
    pub booking_id: Uuid,
    pub new_check_in_date: NaiveDate,
    pub new_check_out_date: Option<NaiveDate>,
    pub original_amount: Decimal,
    pub new_amount: Decimal,
    pub rebooking_fee: Decimal,
    pub total_adjustment: Decimal,
    pub status: crate::entities::rebooking::RebookingStatus,
    pub payment_status: crate::entities::rebooking::RebookingPaymentStatus,
}

impl From<crate::entities::rebooking::Model> for RebookingInfo {
    fn from(r: crate::entities::rebooking::Model) -> Self {
        Self {
            id: r.id,
            rebooking_number: r.rebooking_number,
            booking_id: r.booking_id,
            new_check_in_date: r.new_check_in_date,
            new_check_out_date: r.new_check_out_date,
            original_amount: r.original_amount,
            new_amount: r.new_amount,
            rebooking_fee: r.rebooking_fee,
            total_adjustment: r.total_adjustment,
            status: r.status,
            payment_status: r.payment_status,
        }
    }
}

/// Request a date change against one of the guest's own bookings. The
/// request stays pending until staff processes it.
pub async fn request_rebooking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<RequestRebookingRequest>,
) -> AppResult<Json<RebookingInfo>> {
    let model = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if model.user_id != Some(claims.sub) {
        return Err(AppError::Forbidden(
            "You can only rebook your own bookings".to_string(),
        ));
    }

    let input = NewRebooking {
        booking_id,
        new_check_in_date: payload.new_check_in_date,
        new_check_out_date: payload.new_check_out_date,
        new_adults: payload.new_adults,
        new_children: payload.new_children,
        accommodations: payload
            .accommodations
            .into_iter()
            .map(|a| AccommodationRequest {
                accommodation_id: a.accommodation_id,
                guest_count: a.guest_count,
            })
            .collect(),
        rebooking_fee: state.config.rebooking_fee,
    };

    let rates = EntranceRates {
        adult: state.config.adult_entrance_fee,
        child: state.config.child_entrance_fee,
    };

    let created = rebookings::create_rebooking(&state.db, rates, input, None).await?;
    Ok(Json(created.into()))
}
