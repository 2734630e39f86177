use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{payment, rebooking, refund};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::services::bookings::recompute_paid_amount;
use crate::services::payments::{refresh_rebooking_payment_status, refunded_so_far};
use crate::services::sequence::{self, SequenceKind};

#[derive(Debug, Clone)]
pub struct NewRefund {
    pub payment_id: Uuid,
    pub rebooking_id: Option<Uuid>,
    pub amount: Decimal,
    pub reason: Option<String>,
    pub processed_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct RefundUpdate {
    pub amount: Option<Decimal>,
    pub reason: Option<Option<String>>,
}

fn validate_amount(
    errors: &mut FieldErrors,
    amount: Decimal,
    payment_amount: Decimal,
    already_refunded: Decimal,
) {
    if amount <= Decimal::ZERO {
        errors.add("amount", "Refund amount must be positive");
    } else if already_refunded + amount > payment_amount {
        errors.add(
            "amount",
            "Total refunds cannot exceed the payment amount",
        );
    }
}

/// Issue a refund against a payment. The owning booking's paid-amount
/// aggregate is recomputed in the same transaction, keeping the booking
/// balance consistent with the ledger.
pub async fn create_refund(db: &DatabaseConnection, input: NewRefund) -> AppResult<refund::Model> {
    let txn = db.begin().await?;

    let parent = payment::Entity::find_by_id(input.payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

    let mut errors = FieldErrors::new();

    let already_refunded = refunded_so_far(&txn, parent.id, None).await?;
    validate_amount(&mut errors, input.amount, parent.amount, already_refunded);

    if let Some(rebooking_id) = input.rebooking_id {
        match rebooking::Entity::find_by_id(rebooking_id).one(&txn).await? {
            Some(reb) if reb.booking_id != parent.booking_id => {
                errors.add(
                    "rebooking_id",
                    "Rebooking does not belong to the payment's booking",
                );
            }
            Some(_) => {}
            None => {
                errors.add("rebooking_id", "Unknown rebooking");
            }
        }
    }

    errors.into_result()?;

    let refund_number =
        sequence::next_number(&txn, SequenceKind::Refund, Utc::now().date_naive()).await?;

    let created = refund::ActiveModel {
        id: Set(Uuid::new_v4()),
        refund_number: Set(refund_number),
        payment_id: Set(parent.id),
        rebooking_id: Set(input.rebooking_id),
        amount: Set(input.amount),
        reason: Set(input.reason),
        processed_by: Set(input.processed_by),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    recompute_paid_amount(&txn, parent.booking_id).await?;
    if let Some(rebooking_id) = created.rebooking_id {
        refresh_rebooking_payment_status(&txn, rebooking_id).await?;
    }

    txn.commit().await?;
    Ok(created)
}

/// Amend a refund's amount or reason, re-running the same aggregate
/// recomputation as creation.
pub async fn update_refund(
    db: &DatabaseConnection,
    refund_id: Uuid,
    update: RefundUpdate,
) -> AppResult<refund::Model> {
    let txn = db.begin().await?;

    let existing = refund::Entity::find_by_id(refund_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Refund not found".to_string()))?;

    let parent = payment::Entity::find_by_id(existing.payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Payment {} missing for refund {}",
                existing.payment_id, existing.refund_number
            ))
        })?;

    let amount = update.amount.unwrap_or(existing.amount);

    let mut errors = FieldErrors::new();
    let other_refunds = refunded_so_far(&txn, parent.id, Some(existing.id)).await?;
    validate_amount(&mut errors, amount, parent.amount, other_refunds);
    errors.into_result()?;

    let rebooking_id = existing.rebooking_id;
    let mut active: refund::ActiveModel = existing.into();
    active.amount = Set(amount);
    if let Some(reason) = update.reason {
        active.reason = Set(reason);
    }
    let updated = active.update(&txn).await?;

    recompute_paid_amount(&txn, parent.booking_id).await?;
    if let Some(rebooking_id) = rebooking_id {
        refresh_rebooking_payment_status(&txn, rebooking_id).await?;
    }

    txn.commit().await?;
    Ok(updated)
}

/// Remove a refund and restore the booking aggregate it had reduced.
pub async fn delete_refund(db: &DatabaseConnection, refund_id: Uuid) -> AppResult<()> {
    let txn = db.begin().await?;

    let existing = refund::Entity::find_by_id(refund_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Refund not found".to_string()))?;

    let parent = payment::Entity::find_by_id(existing.payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Payment {} missing for refund {}",
                existing.payment_id, existing.refund_number
            ))
        })?;

    let rebooking_id = existing.rebooking_id;
    existing.delete(&txn).await?;

    recompute_paid_amount(&txn, parent.booking_id).await?;
    if let Some(rebooking_id) = rebooking_id {
        refresh_rebooking_payment_status(&txn, rebooking_id).await?;
    }

    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn refund_must_be_positive() {
        let mut errors = FieldErrors::new();
        validate_amount(&mut errors, dec("0.00"), dec("1000.00"), Decimal::ZERO);
        assert!(!errors.is_empty());

        let mut errors = FieldErrors::new();
        validate_amount(&mut errors, dec("-5.00"), dec("1000.00"), Decimal::ZERO);
        assert!(!errors.is_empty());
    }

    #[test]
    fn refunds_cannot_exceed_the_payment() {
        let mut errors = FieldErrors::new();
        validate_amount(&mut errors, dec("600.00"), dec("1000.00"), dec("500.00"));
        assert!(!errors.is_empty());

        // Exactly reaching the payment amount is allowed
        let mut errors = FieldErrors::new();
        validate_amount(&mut errors, dec("500.00"), dec("1000.00"), dec("500.00"));
        assert!(errors.is_empty());
    }
}
