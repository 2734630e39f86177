use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::payment::PaymentMethod;
use crate::entities::rebooking::{RebookingPaymentStatus, RebookingStatus};
use crate::entities::{booking, payment, rebooking};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::services::bookings::recompute_paid_amount;
use crate::services::reconciliation;
use crate::services::sequence::{self, SequenceKind};

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub booking_id: Uuid,
    pub rebooking_id: Option<Uuid>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference_number: Option<String>,
    pub reference_image: Option<String>,
    pub received_by: Uuid,
}

/// Record a payment against a booking (optionally earmarked for a
/// rebooking adjustment). The booking's paid-amount aggregate and, when
/// linked, the rebooking's payment status are refreshed in the same
/// transaction.
pub async fn create_payment(
    db: &DatabaseConnection,
    input: NewPayment,
) -> AppResult<payment::Model> {
    let txn = db.begin().await?;

    let booking = booking::Entity::find_by_id(input.booking_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let mut errors = FieldErrors::new();

    if input.amount <= Decimal::ZERO {
        errors.add("amount", "Payment amount must be positive");
    }

    if let Some(rebooking_id) = input.rebooking_id {
        match rebooking::Entity::find_by_id(rebooking_id).one(&txn).await? {
            Some(reb) if reb.booking_id != booking.id => {
                errors.add("rebooking_id", "Rebooking does not belong to this booking");
            }
            Some(reb) if !reb.status.is_active() => {
                errors.add(
                    "rebooking_id",
                    "Payments can only be applied to a pending or approved rebooking",
                );
            }
            Some(_) => {}
            None => {
                errors.add("rebooking_id", "Unknown rebooking");
            }
        }
    }

    errors.into_result()?;

    let payment_number =
        sequence::next_number(&txn, SequenceKind::Payment, Utc::now().date_naive()).await?;

    let created = payment::ActiveModel {
        id: Set(Uuid::new_v4()),
        payment_number: Set(payment_number),
        booking_id: Set(booking.id),
        rebooking_id: Set(input.rebooking_id),
        amount: Set(input.amount),
        method: Set(input.method),
        reference_number: Set(input.reference_number),
        reference_image: Set(input.reference_image),
        received_by: Set(input.received_by),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    recompute_paid_amount(&txn, booking.id).await?;
    if let Some(rebooking_id) = created.rebooking_id {
        refresh_rebooking_payment_status(&txn, rebooking_id).await?;
    }

    txn.commit().await?;
    Ok(created)
}

/// Delete a payment, its dependent refunds (by cascade), and its stored
/// reference-image file, then recompute the booking aggregate.
pub async fn delete_payment(
    db: &DatabaseConnection,
    payment_id: Uuid,
    upload_dir: &str,
) -> AppResult<()> {
    let txn = db.begin().await?;

    let existing = payment::Entity::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    let booking_id = existing.booking_id;
    let rebooking_id = existing.rebooking_id;
    let reference_image = existing.reference_image.clone();

    existing.delete(&txn).await?;

    recompute_paid_amount(&txn, booking_id).await?;
    if let Some(rebooking_id) = rebooking_id {
        refresh_rebooking_payment_status(&txn, rebooking_id).await?;
    }

    txn.commit().await?;

    // Artifact cleanup happens after the row is gone for good
    if let Some(image) = reference_image {
        let path = std::path::Path::new(upload_dir).join(image);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!("Failed to remove payment reference image {:?}: {}", path, e);
        }
    }

    Ok(())
}

/// Re-derive a rebooking's payment status from its ledger. Completed
/// rebookings keep their final status.
pub async fn refresh_rebooking_payment_status<C: ConnectionTrait>(
    conn: &C,
    rebooking_id: Uuid,
) -> AppResult<()> {
    let reb = rebooking::Entity::find_by_id(rebooking_id)
        .one(conn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Rebooking {} missing while refreshing payment status",
                rebooking_id
            ))
        })?;

    if reb.status == RebookingStatus::Completed {
        return Ok(());
    }

    let ledger = reconciliation::ledger_for(conn, &reb).await?;
    let next = if !ledger.is_payment_complete() {
        RebookingPaymentStatus::Pending
    } else if ledger.total_adjustment < Decimal::ZERO {
        RebookingPaymentStatus::Refunded
    } else {
        RebookingPaymentStatus::Paid
    };

    if next != reb.payment_status {
        let mut active: rebooking::ActiveModel = reb.into();
        active.payment_status = Set(next);
        active.update(conn).await?;
    }

    Ok(())
}

/// Refunds already issued against a payment, optionally ignoring one
/// refund row (for updates).
pub async fn refunded_so_far<C: ConnectionTrait>(
    conn: &C,
    payment_id: Uuid,
    excluding: Option<Uuid>,
) -> AppResult<Decimal> {
    use crate::entities::refund;

    let mut query = refund::Entity::find().filter(refund::Column::PaymentId.eq(payment_id));
    if let Some(excluded) = excluding {
        query = query.filter(refund::Column::Id.ne(excluded));
    }

    Ok(query.all(conn).await?.iter().map(|r| r.amount).sum())
}
