use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IsolationLevel, QueryFilter,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::booking::RentalCategory;
use crate::entities::booking_entrance_fee::EntranceFeeType;
use crate::entities::rebooking::{RebookingPaymentStatus, RebookingStatus};
use crate::entities::{
    accommodation, booking, booking_accommodation, booking_entrance_fee, rebooking,
    rebooking_accommodation, rebooking_entrance_fee,
};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::services::availability::{self, conflict_message};
use crate::services::bookings::{self, AccommodationRequest, EntranceRates};
use crate::services::reconciliation::{self, total_adjustment};
use crate::services::sequence::{self, SequenceKind};

#[derive(Debug, Clone)]
pub struct NewRebooking {
    pub booking_id: Uuid,
    pub new_check_in_date: NaiveDate,
    pub new_check_out_date: Option<NaiveDate>,
    pub new_adults: i32,
    pub new_children: i32,
    pub accommodations: Vec<AccommodationRequest>,
    pub rebooking_fee: Decimal,
}

/// Create a rebooking proposal against an existing booking. The new dates
/// are availability-checked with the original booking excluded, and the
/// whole check-then-insert runs in one serializable transaction.
/// `processed_by` is the acting staff user; guest-initiated requests leave
/// it unset until a staff member picks the request up.
pub async fn create_rebooking(
    db: &DatabaseConnection,
    rates: EntranceRates,
    input: NewRebooking,
    processed_by: Option<Uuid>,
) -> AppResult<rebooking::Model> {
    let txn = db
        .begin_with_config(Some(IsolationLevel::Serializable), None)
        .await?;

    let original = booking::Entity::find_by_id(input.booking_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let mut errors = FieldErrors::new();

    if original.status.is_terminal() {
        errors.add(
            "booking_id",
            "Cancelled or checked-out bookings cannot be rebooked",
        );
    }

    let active_count = rebooking::Entity::find()
        .filter(rebooking::Column::BookingId.eq(original.id))
        .filter(rebooking::Column::Status.is_in([
            RebookingStatus::Pending,
            RebookingStatus::Approved,
        ]))
        .all(&txn)
        .await?
        .len();
    if active_count > 0 {
        errors.add(
            "booking_id",
            "A rebooking is already pending or approved for this booking",
        );
    }

    match (&original.category, input.new_check_out_date) {
        (RentalCategory::Overnight, None) => {
            errors.add(
                "new_check_out_date",
                "Check-out date is required for overnight bookings",
            );
        }
        (RentalCategory::DayTour, Some(_)) => {
            errors.add(
                "new_check_out_date",
                "Day tour bookings have no check-out date",
            );
        }
        (_, Some(out)) if out <= input.new_check_in_date => {
            errors.add(
                "new_check_out_date",
                "Check-out date must be after check-in date",
            );
        }
        _ => {}
    }

    if input.new_adults < 1 {
        errors.add("new_adults", "At least one adult is required");
    }
    if input.new_children < 0 {
        errors.add("new_children", "Children count cannot be negative");
    }
    if input.accommodations.is_empty() {
        errors.add("accommodations", "At least one accommodation is required");
    }
    if input.rebooking_fee < Decimal::ZERO {
        errors.add("rebooking_fee", "Rebooking fee cannot be negative");
    }

    let mut resolved = Vec::new();
    let mut guest_count_sum = 0;
    for request in &input.accommodations {
        let found = accommodation::Entity::find_by_id(request.accommodation_id)
            .one(&txn)
            .await?;
        match found {
            Some(acc) if acc.is_active => {
                if request.guest_count < 1 {
                    errors.add(
                        "accommodations",
                        format!("{} must host at least one guest", acc.name),
                    );
                } else if request.guest_count > acc.capacity {
                    errors.add(
                        "accommodations",
                        format!(
                            "{} holds up to {} guests, {} requested",
                            acc.name, acc.capacity, request.guest_count
                        ),
                    );
                }
                guest_count_sum += request.guest_count;
                resolved.push((acc, request.guest_count));
            }
            Some(acc) => {
                errors.add(
                    "accommodations",
                    format!("{} is not open for booking", acc.name),
                );
            }
            None => {
                errors.add(
                    "accommodations",
                    format!("Unknown accommodation id {}", request.accommodation_id),
                );
            }
        }
    }

    if resolved.len() == input.accommodations.len()
        && !resolved.is_empty()
        && guest_count_sum != input.new_adults + input.new_children
    {
        errors.add(
            "accommodations",
            "Accommodation guest counts must add up to the rebooking party size",
        );
    }

    let accommodation_ids: Vec<i32> = input
        .accommodations
        .iter()
        .map(|a| a.accommodation_id)
        .collect();
    let conflicts = availability::check_availability(
        &txn,
        &accommodation_ids,
        input.new_check_in_date,
        input.new_check_out_date,
        Some(original.id),
    )
    .await?;
    for conflict in &conflicts {
        errors.add("accommodations", conflict_message(conflict));
    }

    errors.into_result()?;

    let units = Decimal::from(match original.category {
        RentalCategory::DayTour => 1,
        RentalCategory::Overnight => input
            .new_check_out_date
            .map(|out| (out - input.new_check_in_date).num_days().max(1))
            .unwrap_or(1),
    });

    let rebooking_id = Uuid::new_v4();
    let mut accommodation_subtotal = Decimal::ZERO;
    let mut line_items = Vec::new();
    for (acc, guest_count) in &resolved {
        let rate = acc.rate_for(&original.category);
        let subtotal = rate * units;
        accommodation_subtotal += subtotal;
        line_items.push(rebooking_accommodation::ActiveModel {
            id: Set(Uuid::new_v4()),
            rebooking_id: Set(rebooking_id),
            accommodation_id: Set(acc.id),
            guest_count: Set(*guest_count),
            rate: Set(rate),
            subtotal: Set(subtotal),
        });
    }

    let mut entrance_fee_subtotal = Decimal::ZERO;
    let mut fee_items = Vec::new();
    for (fee_type, quantity, rate) in [
        (EntranceFeeType::Adult, input.new_adults, rates.adult),
        (EntranceFeeType::Child, input.new_children, rates.child),
    ] {
        if quantity <= 0 {
            continue;
        }
        let subtotal = rate * Decimal::from(quantity);
        entrance_fee_subtotal += subtotal;
        fee_items.push(rebooking_entrance_fee::ActiveModel {
            id: Set(Uuid::new_v4()),
            rebooking_id: Set(rebooking_id),
            fee_type: Set(fee_type),
            quantity: Set(quantity),
            rate: Set(rate),
            subtotal: Set(subtotal),
        });
    }

    let original_amount = original.total_amount;
    let new_amount = accommodation_subtotal + entrance_fee_subtotal;
    let adjustment = total_adjustment(original_amount, new_amount, input.rebooking_fee);

    let rebooking_number =
        sequence::next_number(&txn, SequenceKind::Rebooking, Utc::now().date_naive()).await?;

    let created = rebooking::ActiveModel {
        id: Set(rebooking_id),
        rebooking_number: Set(rebooking_number),
        booking_id: Set(original.id),
        new_check_in_date: Set(input.new_check_in_date),
        new_check_out_date: Set(input.new_check_out_date),
        new_adults: Set(input.new_adults),
        new_children: Set(input.new_children),
        original_amount: Set(original_amount),
        new_amount: Set(new_amount),
        amount_difference: Set(new_amount - original_amount),
        rebooking_fee: Set(input.rebooking_fee),
        total_adjustment: Set(adjustment),
        status: Set(RebookingStatus::Pending),
        payment_status: Set(RebookingPaymentStatus::Pending),
        processed_by: Set(processed_by),
        approved_at: Set(None),
        completed_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for item in line_items {
        item.insert(&txn).await?;
    }
    for item in fee_items {
        item.insert(&txn).await?;
    }

    txn.commit().await?;
    Ok(created)
}

/// Approve a pending rebooking. From this point the availability checker
/// treats the new dates as the booking's effective dates.
pub async fn approve_rebooking(
    db: &DatabaseConnection,
    rebooking_id: Uuid,
    actor: Uuid,
) -> AppResult<rebooking::Model> {
    let existing = find_rebooking(db, rebooking_id).await?;
    ensure_transition(&existing, RebookingStatus::Approved)?;

    let mut active: rebooking::ActiveModel = existing.into();
    active.status = Set(RebookingStatus::Approved);
    active.processed_by = Set(Some(actor));
    active.approved_at = Set(Some(Utc::now().into()));
    Ok(active.update(db).await?)
}

/// Complete an approved rebooking: requires the financial adjustment to be
/// settled, then folds the amendment into the original booking (dates,
/// party, line items, totals) so the original slot is released for good.
pub async fn complete_rebooking(
    db: &DatabaseConnection,
    rebooking_id: Uuid,
    actor: Uuid,
) -> AppResult<rebooking::Model> {
    let txn = db
        .begin_with_config(Some(IsolationLevel::Serializable), None)
        .await?;

    let existing = rebooking::Entity::find_by_id(rebooking_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Rebooking not found".to_string()))?;
    ensure_transition(&existing, RebookingStatus::Completed)?;

    let ledger = reconciliation::ledger_for(&txn, &existing).await?;
    if !ledger.is_payment_complete() {
        let mut errors = FieldErrors::new();
        if ledger.total_adjustment > Decimal::ZERO {
            errors.add(
                "payment_status",
                format!(
                    "Payment of {} is still due before completion",
                    ledger.remaining_payment_due()
                ),
            );
        } else {
            errors.add(
                "payment_status",
                format!(
                    "Refund of {} is still due before completion",
                    ledger.remaining_refund_due()
                ),
            );
        }
        errors.into_result()?;
    }

    let booking = booking::Entity::find_by_id(existing.booking_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Booking {} missing for rebooking {}",
                existing.booking_id, existing.rebooking_number
            ))
        })?;

    // Fold the amendment into the booking
    let new_line_items = rebooking_accommodation::Entity::find()
        .filter(rebooking_accommodation::Column::RebookingId.eq(existing.id))
        .all(&txn)
        .await?;
    let new_fee_items = rebooking_entrance_fee::Entity::find()
        .filter(rebooking_entrance_fee::Column::RebookingId.eq(existing.id))
        .all(&txn)
        .await?;

    booking_accommodation::Entity::delete_many()
        .filter(booking_accommodation::Column::BookingId.eq(booking.id))
        .exec(&txn)
        .await?;
    booking_entrance_fee::Entity::delete_many()
        .filter(booking_entrance_fee::Column::BookingId.eq(booking.id))
        .exec(&txn)
        .await?;

    let mut accommodation_subtotal = Decimal::ZERO;
    for item in &new_line_items {
        accommodation_subtotal += item.subtotal;
        booking_accommodation::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking.id),
            accommodation_id: Set(item.accommodation_id),
            guest_count: Set(item.guest_count),
            rate: Set(item.rate),
            subtotal: Set(item.subtotal),
        }
        .insert(&txn)
        .await?;
    }
    let mut entrance_fee_subtotal = Decimal::ZERO;
    for item in &new_fee_items {
        entrance_fee_subtotal += item.subtotal;
        booking_entrance_fee::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking.id),
            fee_type: Set(item.fee_type.clone()),
            quantity: Set(item.quantity),
            rate: Set(item.rate),
            subtotal: Set(item.subtotal),
        }
        .insert(&txn)
        .await?;
    }

    let booking_id = booking.id;
    let mut active_booking: booking::ActiveModel = booking.into();
    active_booking.check_in_date = Set(existing.new_check_in_date);
    active_booking.check_out_date = Set(existing.new_check_out_date);
    active_booking.adults = Set(existing.new_adults);
    active_booking.children = Set(existing.new_children);
    active_booking.accommodation_subtotal = Set(accommodation_subtotal);
    active_booking.entrance_fee_subtotal = Set(entrance_fee_subtotal);
    active_booking.total_amount =
        Set(existing.new_amount + existing.rebooking_fee);
    active_booking.update(&txn).await?;

    bookings::recompute_paid_amount(&txn, booking_id).await?;

    let payment_status = if existing.total_adjustment < Decimal::ZERO {
        RebookingPaymentStatus::Refunded
    } else {
        RebookingPaymentStatus::Paid
    };

    let mut active: rebooking::ActiveModel = existing.into();
    active.status = Set(RebookingStatus::Completed);
    active.payment_status = Set(payment_status);
    active.processed_by = Set(Some(actor));
    active.completed_at = Set(Some(Utc::now().into()));
    let completed = active.update(&txn).await?;

    txn.commit().await?;
    Ok(completed)
}

/// Cancel a pending or approved rebooking; the original booking's dates
/// become the effective dates again.
pub async fn cancel_rebooking(
    db: &DatabaseConnection,
    rebooking_id: Uuid,
    actor: Uuid,
) -> AppResult<rebooking::Model> {
    let existing = find_rebooking(db, rebooking_id).await?;
    ensure_transition(&existing, RebookingStatus::Cancelled)?;

    let mut active: rebooking::ActiveModel = existing.into();
    active.status = Set(RebookingStatus::Cancelled);
    active.processed_by = Set(Some(actor));
    Ok(active.update(db).await?)
}

async fn find_rebooking(
    db: &DatabaseConnection,
    rebooking_id: Uuid,
) -> AppResult<rebooking::Model> {
    rebooking::Entity::find_by_id(rebooking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Rebooking not found".to_string()))
}

fn ensure_transition(existing: &rebooking::Model, next: RebookingStatus) -> AppResult<()> {
    if existing.status.can_transition_to(&next) {
        return Ok(());
    }
    let mut errors = FieldErrors::new();
    errors.add(
        "status",
        format!(
            "Cannot change rebooking status from {:?} to {:?}",
            existing.status, next
        ),
    );
    errors.into_result()
}
