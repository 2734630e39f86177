use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{BookingChannel, BookingStatus, RentalCategory};
use crate::entities::payment::PaymentMethod;
use crate::entities::{booking, payment, rebooking, refund};
use crate::error::{AppError, AppResult};
use crate::handlers::guest::{
    booking_response, AccommodationSelection, BookingResponse, RebookingInfo,
};
use crate::services::bookings::{self, AccommodationRequest, BookingUpdate, EntranceRates, NewBooking};
use crate::services::payments::{self, NewPayment};
use crate::services::rebookings::{self, NewRebooking};
use crate::services::reconciliation;
use crate::services::refunds::{self, NewRefund, RefundUpdate};
use crate::utils::jwt::Claims;
use crate::AppState;

fn entrance_rates(state: &AppState) -> EntranceRates {
    EntranceRates {
        adult: state.config.adult_entrance_fee,
        child: state.config.child_entrance_fee,
    }
}

// ============ Bookings ============

#[derive(Debug, Deserialize)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub check_in_from: Option<NaiveDate>,
    pub check_in_to: Option<NaiveDate>,
}

/// List bookings, optionally filtered by status and check-in window
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(filter): Query<BookingFilter>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let mut query = booking::Entity::find().order_by_desc(booking::Column::CreatedAt);

    if let Some(status) = filter.status {
        query = query.filter(booking::Column::Status.eq(status));
    }
    if let Some(from) = filter.check_in_from {
        query = query.filter(booking::Column::CheckInDate.gte(from));
    }
    if let Some(to) = filter.check_in_to {
        query = query.filter(booking::Column::CheckInDate.lte(to));
    }

    let models = query.all(&state.db).await?;

    let mut responses = Vec::new();
    for model in models {
        responses.push(booking_response(&state, model).await?);
    }

    Ok(Json(responses))
}

#[derive(Debug, Serialize)]
pub struct PaymentInfo {
    pub id: Uuid,
    pub payment_number: String,
    pub booking_id: Uuid,
    pub rebooking_id: Option<Uuid>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference_number: Option<String>,
    pub received_by: Uuid,
}

impl From<payment::Model> for PaymentInfo {
    fn from(p: payment::Model) -> Self {
        Self {
            id: p.id,
            payment_number: p.payment_number,
            booking_id: p.booking_id,
            rebooking_id: p.rebooking_id,
            amount: p.amount,
            method: p.method,
            reference_number: p.reference_number,
            received_by: p.received_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookingDetailResponse {
    #[serde(flatten)]
    pub booking: BookingResponse,
    pub payments: Vec<PaymentInfo>,
    pub rebookings: Vec<RebookingInfo>,
}

/// Get a booking with its payment and rebooking history
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<BookingDetailResponse>> {
    let model = booking::Entity::find_by_id(booking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let payments = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking_id))
        .order_by_asc(payment::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let rebookings = rebooking::Entity::find()
        .filter(rebooking::Column::BookingId.eq(booking_id))
        .order_by_desc(rebooking::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(BookingDetailResponse {
        booking: booking_response(&state, model).await?,
        payments: payments.into_iter().map(Into::into).collect(),
        rebookings: rebookings.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateWalkInRequest {
    pub category: RentalCategory,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: Option<NaiveDate>,
    pub adults: i32,
    pub children: i32,
    pub accommodations: Vec<AccommodationSelection>,
    pub downpayment_required: bool,
    pub downpayment_amount: Option<Decimal>,
}

/// Create a walk-in booking on behalf of a guest at the front desk
pub async fn create_walkin_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateWalkInRequest>,
) -> AppResult<Json<BookingResponse>> {
    let input = NewBooking {
        channel: BookingChannel::WalkIn,
        category: payload.category,
        guest_name: payload.guest_name,
        guest_email: payload.guest_email,
        guest_phone: payload.guest_phone,
        user_id: None,
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
        downpayment_required: payload.downpayment_required,
        downpayment_amount: payload.downpayment_amount,
    };

    let created =
        bookings::create_booking(&state.db, entrance_rates(&state), input, Some(claims.sub))
            .await?;
    Ok(Json(booking_response(&state, created).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBookingRequest {
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<Option<NaiveDate>>,
    pub adults: Option<i32>,
    pub children: Option<i32>,
    pub downpayment_required: Option<bool>,
    pub downpayment_amount: Option<Option<Decimal>>,
}

/// Update booking details (dates re-run the availability check)
pub async fn update_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateBookingRequest>,
) -> AppResult<Json<BookingResponse>> {
    let update = BookingUpdate {
        guest_name: payload.guest_name,
        guest_email: payload.guest_email,
        guest_phone: payload.guest_phone,
        check_in_date: payload.check_in_date,
        check_out_date: payload.check_out_date,
        adults: payload.adults,
        children: payload.children,
        downpayment_required: payload.downpayment_required,
        downpayment_amount: payload.downpayment_amount,
    };

    let updated = bookings::update_booking(&state.db, booking_id, update).await?;
    Ok(Json(booking_response(&state, updated).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// Move a booking through its lifecycle
pub async fn update_status(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<BookingResponse>> {
    let updated = bookings::update_status(&state.db, booking_id, payload.status).await?;
    Ok(Json(booking_response(&state, updated).await?))
}

// ============ Payments ============

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    pub booking_id: Uuid,
    pub rebooking_id: Option<Uuid>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference_number: Option<String>,
    pub reference_image: Option<String>,
}

/// Record a payment received at the front desk
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePaymentRequest>,
) -> AppResult<Json<PaymentInfo>> {
    let created = payments::create_payment(
        &state.db,
        NewPayment {
            booking_id: payload.booking_id,
            rebooking_id: payload.rebooking_id,
            amount: payload.amount,
            method: payload.method,
            reference_number: payload.reference_number,
            reference_image: payload.reference_image,
            received_by: claims.sub,
        },
    )
    .await?;

    Ok(Json(created.into()))
}

/// Delete a mistaken payment (also removes its reference image file)
pub async fn delete_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    payments::delete_payment(&state.db, payment_id, &state.config.upload_dir).await?;
    Ok(Json(serde_json::json!({ "message": "Payment deleted" })))
}

// ============ Refunds ============

#[derive(Debug, Serialize)]
pub struct RefundInfo {
    pub id: Uuid,
    pub refund_number: String,
    pub payment_id: Uuid,
    pub rebooking_id: Option<Uuid>,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub processed_by: Uuid,
}

impl From<refund::Model> for RefundInfo {
    fn from(r: refund::Model) -> Self {
        Self {
            id: r.id,
            refund_number: r.refund_number,
            payment_id: r.payment_id,
            rebooking_id: r.rebooking_id,
            amount: r.amount,
            reason: r.reason,
            processed_by: r.processed_by,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRefundRequest {
    pub payment_id: Uuid,
    pub rebooking_id: Option<Uuid>,
    pub amount: Decimal,
    pub reason: Option<String>,
}

/// Issue a refund against a payment
pub async fn create_refund(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRefundRequest>,
) -> AppResult<Json<RefundInfo>> {
    let created = refunds::create_refund(
        &state.db,
        NewRefund {
            payment_id: payload.payment_id,
            rebooking_id: payload.rebooking_id,
            amount: payload.amount,
            reason: payload.reason,
            processed_by: claims.sub,
        },
    )
    .await?;

    Ok(Json(created.into()))
}

#[derive(Debug, Deserialize)]
pub struct UpdateRefundRequest {
    pub amount: Option<Decimal>,
    pub reason: Option<Option<String>>,
}

/// Amend a refund
pub async fn update_refund(
    State(state): State<AppState>,
    Path(refund_id): Path<Uuid>,
    Json(payload): Json<UpdateRefundRequest>,
) -> AppResult<Json<RefundInfo>> {
    let updated = refunds::update_refund(
        &state.db,
        refund_id,
        RefundUpdate {
            amount: payload.amount,
            reason: payload.reason,
        },
    )
    .await?;

    Ok(Json(updated.into()))
}

/// Remove a refund
pub async fn delete_refund(
    State(state): State<AppState>,
    Path(refund_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    refunds::delete_refund(&state.db, refund_id).await?;
    Ok(Json(serde_json::json!({ "message": "Refund deleted" })))
}

// ============ Rebookings ============

#[derive(Debug, Deserialize)]
pub struct RebookingFilter {
    pub booking_id: Option<Uuid>,
    pub status: Option<crate::entities::rebooking::RebookingStatus>,
}

/// List rebookings, optionally filtered by booking or status
pub async fn list_rebookings(
    State(state): State<AppState>,
    Query(filter): Query<RebookingFilter>,
) -> AppResult<Json<Vec<RebookingInfo>>> {
    let mut query = rebooking::Entity::find().order_by_desc(rebooking::Column::CreatedAt);

    if let Some(booking_id) = filter.booking_id {
        query = query.filter(rebooking::Column::BookingId.eq(booking_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(rebooking::Column::Status.eq(status));
    }

    let models = query.all(&state.db).await?;
    Ok(Json(models.into_iter().map(Into::into).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateRebookingRequest {
    pub booking_id: Uuid,
    pub new_check_in_date: NaiveDate,
    pub new_check_out_date: Option<NaiveDate>,
    pub new_adults: i32,
    pub new_children: i32,
    pub accommodations: Vec<AccommodationSelection>,
}

/// Open a rebooking on behalf of a guest
pub async fn create_rebooking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRebookingRequest>,
) -> AppResult<Json<RebookingInfo>> {
    let input = NewRebooking {
        booking_id: payload.booking_id,
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

    let created =
        rebookings::create_rebooking(&state.db, entrance_rates(&state), input, Some(claims.sub))
            .await?;
    Ok(Json(created.into()))
}

/// Approve a pending rebooking; its new dates become effective for
/// availability
pub async fn approve_rebooking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(rebooking_id): Path<Uuid>,
) -> AppResult<Json<RebookingInfo>> {
    let updated = rebookings::approve_rebooking(&state.db, rebooking_id, claims.sub).await?;
    Ok(Json(updated.into()))
}

/// Complete an approved rebooking once its adjustment is settled
pub async fn complete_rebooking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(rebooking_id): Path<Uuid>,
) -> AppResult<Json<RebookingInfo>> {
    let updated = rebookings::complete_rebooking(&state.db, rebooking_id, claims.sub).await?;
    Ok(Json(updated.into()))
}

/// Cancel a pending or approved rebooking
pub async fn cancel_rebooking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(rebooking_id): Path<Uuid>,
) -> AppResult<Json<RebookingInfo>> {
    let updated = rebookings::cancel_rebooking(&state.db, rebooking_id, claims.sub).await?;
    Ok(Json(updated.into()))
}

#[derive(Debug, Serialize)]
pub struct RebookingLedgerResponse {
    pub rebooking_id: Uuid,
    pub rebooking_number: String,
    pub total_adjustment: Decimal,
    pub total_paid: Decimal,
    pub total_refunded: Decimal,
    pub remaining_payment_due: Decimal,
    pub remaining_refund_due: Decimal,
    pub is_payment_complete: bool,
}

/// Financial position of a rebooking: what is owed in which direction and
/// whether it is settled
pub async fn rebooking_ledger(
    State(state): State<AppState>,
    Path(rebooking_id): Path<Uuid>,
) -> AppResult<Json<RebookingLedgerResponse>> {
    let model = rebooking::Entity::find_by_id(rebooking_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Rebooking not found".to_string()))?;

    let ledger = reconciliation::ledger_for(&state.db, &model).await?;

    Ok(Json(RebookingLedgerResponse {
        rebooking_id: model.id,
        rebooking_number: model.rebooking_number,
        total_adjustment: ledger.total_adjustment,
        total_paid: ledger.total_paid,
        total_refunded: ledger.total_refunded,
        remaining_payment_due: ledger.remaining_payment_due(),
        remaining_refund_due: ledger.remaining_refund_due(),
        is_payment_complete: ledger.is_payment_complete(),
    }))
}
