use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IsolationLevel, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::booking::{BookingChannel, BookingStatus, RentalCategory};
use crate::entities::booking_entrance_fee::EntranceFeeType;
use crate::entities::{accommodation, booking, booking_accommodation, booking_entrance_fee};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::services::availability::{self, conflict_message};
use crate::services::sequence::{self, SequenceKind};

/// One accommodation requested for a stay, with the party split assigned
/// to it.
#[derive(Debug, Clone)]
pub struct AccommodationRequest {
    pub accommodation_id: i32,
    pub guest_count: i32,
}

/// Entrance fee rates in effect for a creation call (from configuration).
#[derive(Debug, Clone, Copy)]
pub struct EntranceRates {
    pub adult: Decimal,
    pub child: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub channel: BookingChannel,
    pub category: RentalCategory,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub user_id: Option<Uuid>,
    pub check_in_date: NaiveDate,
    pub check_out_date: Option<NaiveDate>,
    pub adults: i32,
    pub children: i32,
    pub accommodations: Vec<AccommodationRequest>,
    pub downpayment_required: bool,
    pub downpayment_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingUpdate {
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

/// Number of chargeable units for a stay: nights for overnight rentals,
/// a single day otherwise.
fn stay_units(category: &RentalCategory, check_in: NaiveDate, check_out: Option<NaiveDate>) -> i64 {
    match category {
        RentalCategory::DayTour => 1,
        RentalCategory::Overnight => check_out
            .map(|out| (out - check_in).num_days().max(1))
            .unwrap_or(1),
    }
}

fn validate_dates(
    errors: &mut FieldErrors,
    category: &RentalCategory,
    check_in: NaiveDate,
    check_out: Option<NaiveDate>,
) {
    match (category, check_out) {
        (RentalCategory::Overnight, None) => {
            errors.add("check_out_date", "Check-out date is required for overnight bookings");
        }
        (RentalCategory::DayTour, Some(_)) => {
            errors.add("check_out_date", "Day tour bookings have no check-out date");
        }
        (_, Some(out)) if out <= check_in => {
            errors.add("check_out_date", "Check-out date must be after check-in date");
        }
        _ => {}
    }
}

fn validate_party(errors: &mut FieldErrors, adults: i32, children: i32) {
    if adults < 1 {
        errors.add("adults", "At least one adult is required");
    }
    if children < 0 {
        errors.add("children", "Children count cannot be negative");
    }
}

fn validate_downpayment(
    errors: &mut FieldErrors,
    required: bool,
    amount: Option<Decimal>,
    already_paid: Decimal,
) {
    match (required, amount) {
        (true, None) => {
            errors.add(
                "downpayment_amount",
                "Down-payment amount is required when a down payment is required",
            );
        }
        (false, Some(_)) => {
            errors.add(
                "downpayment_amount",
                "Down-payment amount cannot be set when no down payment is required",
            );
        }
        (true, Some(amount)) => {
            if amount <= Decimal::ZERO {
                errors.add("downpayment_amount", "Down-payment amount must be positive");
            } else if amount < already_paid {
                errors.add(
                    "downpayment_amount",
                    "Down-payment amount cannot be reduced below the amount already paid",
                );
            }
        }
        (false, None) => {}
    }
}

/// Create a booking. Field-level validation, the availability check, and
/// the insert all run inside one serializable transaction so a concurrent
/// creation for the same accommodation and dates cannot slip between the
/// check and the write. `actor` is the staff user creating a walk-in
/// booking, if any.
pub async fn create_booking(
    db: &DatabaseConnection,
    rates: EntranceRates,
    input: NewBooking,
    actor: Option<Uuid>,
) -> AppResult<booking::Model> {
    let txn = db
        .begin_with_config(Some(IsolationLevel::Serializable), None)
        .await?;

    let mut errors = FieldErrors::new();

    validate_dates(
        &mut errors,
        &input.category,
        input.check_in_date,
        input.check_out_date,
    );
    validate_party(&mut errors, input.adults, input.children);
    validate_downpayment(
        &mut errors,
        input.downpayment_required,
        input.downpayment_amount,
        Decimal::ZERO,
    );

    if input.check_in_date < Utc::now().date_naive() {
        errors.add("check_in_date", "Check-in date cannot be in the past");
    }

    if input.accommodations.is_empty() {
        errors.add("accommodations", "At least one accommodation is required");
    }

    // Resolve requested accommodations and their rates
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
        && guest_count_sum != input.adults + input.children
    {
        errors.add(
            "accommodations",
            "Accommodation guest counts must add up to the booking party size",
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
        input.check_in_date,
        input.check_out_date,
        None,
    )
    .await?;
    for conflict in &conflicts {
        errors.add("accommodations", conflict_message(conflict));
    }

    errors.into_result()?;

    let units = stay_units(&input.category, input.check_in_date, input.check_out_date);
    let units = Decimal::from(units);

    let booking_id = Uuid::new_v4();
    let mut accommodation_subtotal = Decimal::ZERO;
    let mut line_items = Vec::new();
    for (acc, guest_count) in &resolved {
        let rate = acc.rate_for(&input.category);
        let subtotal = rate * units;
        accommodation_subtotal += subtotal;
        line_items.push(booking_accommodation::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            accommodation_id: Set(acc.id),
            guest_count: Set(*guest_count),
            rate: Set(rate),
            subtotal: Set(subtotal),
        });
    }

    let mut entrance_fee_subtotal = Decimal::ZERO;
    let mut fee_items = Vec::new();
    for (fee_type, quantity, rate) in [
        (EntranceFeeType::Adult, input.adults, rates.adult),
        (EntranceFeeType::Child, input.children, rates.child),
    ] {
        if quantity <= 0 {
            continue;
        }
        let subtotal = rate * Decimal::from(quantity);
        entrance_fee_subtotal += subtotal;
        fee_items.push(booking_entrance_fee::ActiveModel {
            id: Set(Uuid::new_v4()),
            booking_id: Set(booking_id),
            fee_type: Set(fee_type),
            quantity: Set(quantity),
            rate: Set(rate),
            subtotal: Set(subtotal),
        });
    }

    let booking_number =
        sequence::next_number(&txn, SequenceKind::Booking, Utc::now().date_naive()).await?;

    let created = booking::ActiveModel {
        id: Set(booking_id),
        booking_number: Set(booking_number),
        channel: Set(input.channel),
        category: Set(input.category),
        guest_name: Set(input.guest_name),
        guest_email: Set(input.guest_email),
        guest_phone: Set(input.guest_phone),
        user_id: Set(input.user_id),
        check_in_date: Set(input.check_in_date),
        check_out_date: Set(input.check_out_date),
        adults: Set(input.adults),
        children: Set(input.children),
        accommodation_subtotal: Set(accommodation_subtotal),
        entrance_fee_subtotal: Set(entrance_fee_subtotal),
        total_amount: Set(accommodation_subtotal + entrance_fee_subtotal),
        paid_amount: Set(Decimal::ZERO),
        downpayment_required: Set(input.downpayment_required),
        downpayment_amount: Set(input.downpayment_amount),
        status: Set(BookingStatus::Pending),
        created_by: Set(actor),
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

/// Update guest details, dates, or down-payment settings on a live
/// booking. Date changes re-run the availability check with the booking
/// itself excluded, inside a serializable transaction.
pub async fn update_booking(
    db: &DatabaseConnection,
    booking_id: Uuid,
    update: BookingUpdate,
) -> AppResult<booking::Model> {
    let txn = db
        .begin_with_config(Some(IsolationLevel::Serializable), None)
        .await?;

    let existing = booking::Entity::find_by_id(booking_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let mut errors = FieldErrors::new();

    if existing.status.is_terminal() {
        errors.add(
            "status",
            "Cancelled or checked-out bookings can no longer be edited",
        );
    }

    let check_in = update.check_in_date.unwrap_or(existing.check_in_date);
    let check_out = update.check_out_date.unwrap_or(existing.check_out_date);
    let dates_changed = check_in != existing.check_in_date || check_out != existing.check_out_date;

    if update.check_in_date.is_some_and(|d| d != existing.check_in_date)
        && matches!(
            existing.status,
            BookingStatus::CheckedIn | BookingStatus::CheckedOut
        )
    {
        errors.add(
            "check_in_date",
            "Check-in date can no longer change once the guest has checked in",
        );
    }

    validate_dates(&mut errors, &existing.category, check_in, check_out);

    let adults = update.adults.unwrap_or(existing.adults);
    let children = update.children.unwrap_or(existing.children);
    validate_party(&mut errors, adults, children);

    let downpayment_required = update
        .downpayment_required
        .unwrap_or(existing.downpayment_required);
    let downpayment_amount = update
        .downpayment_amount
        .unwrap_or(existing.downpayment_amount);
    validate_downpayment(
        &mut errors,
        downpayment_required,
        downpayment_amount,
        existing.paid_amount,
    );

    let line_items = booking_accommodation::Entity::find()
        .filter(booking_accommodation::Column::BookingId.eq(booking_id))
        .all(&txn)
        .await?;

    if adults != existing.adults || children != existing.children {
        let mut capacity_sum = 0;
        for item in &line_items {
            if let Some(acc) = accommodation::Entity::find_by_id(item.accommodation_id)
                .one(&txn)
                .await?
            {
                capacity_sum += acc.capacity;
            }
        }
        if adults + children > capacity_sum {
            errors.add(
                "adults",
                format!(
                    "Party of {} exceeds the booked capacity of {}",
                    adults + children,
                    capacity_sum
                ),
            );
        }
    }

    if dates_changed {
        let accommodation_ids: Vec<i32> =
            line_items.iter().map(|item| item.accommodation_id).collect();
        let conflicts = availability::check_availability(
            &txn,
            &accommodation_ids,
            check_in,
            check_out,
            Some(booking_id),
        )
        .await?;
        for conflict in &conflicts {
            errors.add("accommodations", conflict_message(conflict));
        }
    }

    errors.into_result()?;

    let mut active: booking::ActiveModel = existing.into();
    if let Some(name) = update.guest_name {
        active.guest_name = Set(name);
    }
    if let Some(email) = update.guest_email {
        active.guest_email = Set(email);
    }
    if let Some(phone) = update.guest_phone {
        active.guest_phone = Set(phone);
    }
    active.check_in_date = Set(check_in);
    active.check_out_date = Set(check_out);
    active.adults = Set(adults);
    active.children = Set(children);
    active.downpayment_required = Set(downpayment_required);
    active.downpayment_amount = Set(downpayment_amount);

    let updated = active.update(&txn).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Guards applied at the status-update boundary: the transition table plus
/// the financial rule that a fully paid booking must be refunded before it
/// can be cancelled.
fn status_transition_errors(
    current: &BookingStatus,
    fully_paid: bool,
    next: &BookingStatus,
) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !current.can_transition_to(next) {
        let message = match current {
            BookingStatus::Cancelled => {
                "Cancelled bookings cannot be reactivated; create a new booking instead"
                    .to_string()
            }
            BookingStatus::CheckedOut => {
                "Checked-out bookings can no longer change status".to_string()
            }
            _ => format!("Cannot change status from {:?} to {:?}", current, next),
        };
        errors.add("status", message);
    }

    if *next == BookingStatus::Cancelled && fully_paid {
        errors.add(
            "status",
            "Cannot cancel a fully paid booking; process a refund first",
        );
    }

    errors
}

/// Apply a status transition, enforcing the state machine and the
/// financial guards at the update boundary.
pub async fn update_status(
    db: &DatabaseConnection,
    booking_id: Uuid,
    next: BookingStatus,
) -> AppResult<booking::Model> {
    let existing = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if existing.status == next {
        return Ok(existing);
    }

    status_transition_errors(&existing.status, existing.is_fully_paid(), &next).into_result()?;

    let mut active: booking::ActiveModel = existing.into();
    active.status = Set(next);
    Ok(active.update(db).await?)
}

/// Recompute a booking's cached paid-amount aggregate from its payment and
/// refund ledger. A missing booking here is an integrity fault, not a user
/// error.
pub async fn recompute_paid_amount<C: ConnectionTrait>(
    conn: &C,
    booking_id: Uuid,
) -> AppResult<booking::Model> {
    use crate::entities::{payment, refund};

    let existing = booking::Entity::find_by_id(booking_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Booking {} missing while recomputing paid amount",
                booking_id
            ))
        })?;

    let payments = payment::Entity::find()
        .filter(payment::Column::BookingId.eq(booking_id))
        .all(conn)
        .await?;
    let paid: Decimal = payments.iter().map(|p| p.amount).sum();

    let payment_ids: Vec<Uuid> = payments.iter().map(|p| p.id).collect();
    let refunded: Decimal = if payment_ids.is_empty() {
        Decimal::ZERO
    } else {
        refund::Entity::find()
            .filter(refund::Column::PaymentId.is_in(payment_ids))
            .all(conn)
            .await?
            .iter()
            .map(|r| r.amount)
            .sum()
    };

    let mut active: booking::ActiveModel = existing.into();
    active.paid_amount = Set(paid - refunded);
    Ok(active.update(conn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn overnight_requires_checkout_after_checkin() {
        let mut errors = FieldErrors::new();
        validate_dates(&mut errors, &RentalCategory::Overnight, d(2025, 6, 10), None);
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        validate_dates(
            &mut errors,
            &RentalCategory::Overnight,
            d(2025, 6, 10),
            Some(d(2025, 6, 10)),
        );
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        validate_dates(
            &mut errors,
            &RentalCategory::Overnight,
            d(2025, 6, 10),
            Some(d(2025, 6, 12)),
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn day_tour_rejects_checkout() {
        let mut errors = FieldErrors::new();
        validate_dates(
            &mut errors,
            &RentalCategory::DayTour,
            d(2025, 6, 10),
            Some(d(2025, 6, 11)),
        );
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        validate_dates(&mut errors, &RentalCategory::DayTour, d(2025, 6, 10), None);
        assert!(errors.is_empty());
    }

    #[test]
    fn stay_units_count_nights_for_overnight() {
        assert_eq!(
            stay_units(&RentalCategory::Overnight, d(2025, 6, 10), Some(d(2025, 6, 12))),
            2
        );
        assert_eq!(
            stay_units(&RentalCategory::Overnight, d(2025, 6, 10), Some(d(2025, 6, 11))),
            1
        );
        assert_eq!(stay_units(&RentalCategory::DayTour, d(2025, 6, 10), None), 1);
    }

    #[test]
    fn downpayment_rules() {
        // Required but missing
        let mut errors = FieldErrors::new();
        validate_downpayment(&mut errors, true, None, Decimal::ZERO);
        assert!(!errors.is_empty());

        // Set while not required
        let mut errors = FieldErrors::new();
        validate_downpayment(&mut errors, false, Some(dec("500.00")), Decimal::ZERO);
        assert!(!errors.is_empty());

        // Cannot drop below what was already paid
        let mut errors = FieldErrors::new();
        validate_downpayment(&mut errors, true, Some(dec("400.00")), dec("500.00"));
        assert!(!errors.is_empty());

        // Equal to paid amount is allowed
        let mut errors = FieldErrors::new();
        validate_downpayment(&mut errors, true, Some(dec("500.00")), dec("500.00"));
        assert!(errors.is_empty());

        // Neither required nor set
        let mut errors = FieldErrors::new();
        validate_downpayment(&mut errors, false, None, dec("500.00"));
        assert!(errors.is_empty());
    }

    #[test]
    fn party_must_have_an_adult() {
        let mut errors = FieldErrors::new();
        validate_party(&mut errors, 0, 3);
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        validate_party(&mut errors, 1, 0);
        assert!(errors.is_empty());
    }

    #[test]
    fn fully_paid_booking_cannot_be_cancelled() {
        let errors =
            status_transition_errors(&BookingStatus::Confirmed, true, &BookingStatus::Cancelled);
        assert_eq!(errors.messages("status").len(), 1);
        assert!(errors.messages("status")[0].contains("refund"));

        // With an outstanding balance the same transition is allowed
        let errors =
            status_transition_errors(&BookingStatus::Confirmed, false, &BookingStatus::Cancelled);
        assert!(errors.is_empty());
    }

    #[test]
    fn terminal_statuses_report_specific_messages() {
        let errors =
            status_transition_errors(&BookingStatus::Cancelled, false, &BookingStatus::Confirmed);
        assert!(errors.messages("status")[0].contains("reactivated"));

        let errors =
            status_transition_errors(&BookingStatus::CheckedOut, false, &BookingStatus::CheckedIn);
        assert!(errors.messages("status")[0].contains("no longer change"));
    }

    #[test]
    fn legal_transitions_produce_no_errors() {
        let errors =
            status_transition_errors(&BookingStatus::Pending, false, &BookingStatus::Confirmed);
        assert!(errors.is_empty());

        let errors =
            status_transition_errors(&BookingStatus::CheckedIn, true, &BookingStatus::CheckedOut);
        assert!(errors.is_empty());
    }
}
