use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::entities::{payment, rebooking, refund};
use crate::error::AppResult;

/// Net financial delta a rebooking creates. Positive: guest owes more;
/// negative: the resort owes a refund.
pub fn total_adjustment(
    original_amount: Decimal,
    new_amount: Decimal,
    rebooking_fee: Decimal,
) -> Decimal {
    (new_amount - original_amount) + rebooking_fee
}

/// Aggregates of a rebooking's money movement. All arithmetic is exact
/// decimal with 2 fractional digits; comparisons carry no epsilon.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RebookingLedger {
    pub total_adjustment: Decimal,
    pub total_paid: Decimal,
    pub total_refunded: Decimal,
}

impl RebookingLedger {
    pub fn remaining_payment_due(&self) -> Decimal {
        if self.total_adjustment <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            (self.total_adjustment - self.total_paid).max(Decimal::ZERO)
        }
    }

    pub fn remaining_refund_due(&self) -> Decimal {
        if self.total_adjustment >= Decimal::ZERO {
            Decimal::ZERO
        } else {
            (self.total_adjustment.abs() - self.total_refunded).max(Decimal::ZERO)
        }
    }

    pub fn is_payment_complete(&self) -> bool {
        if self.total_adjustment.is_zero() {
            true
        } else if self.total_adjustment > Decimal::ZERO {
            self.total_paid >= self.total_adjustment
        } else {
            self.total_refunded >= self.total_adjustment.abs()
        }
    }
}

/// Load the payment/refund aggregates for a rebooking and pair them with
/// its stored adjustment.
pub async fn ledger_for<C: ConnectionTrait>(
    conn: &C,
    reb: &rebooking::Model,
) -> AppResult<RebookingLedger> {
    let payments = payment::Entity::find()
        .filter(payment::Column::RebookingId.eq(reb.id))
        .all(conn)
        .await?;
    let total_paid: Decimal = payments.iter().map(|p| p.amount).sum();

    let refunds = refund::Entity::find()
        .filter(refund::Column::RebookingId.eq(reb.id))
        .all(conn)
        .await?;
    let total_refunded: Decimal = refunds.iter().map(|r| r.amount).sum();

    Ok(RebookingLedger {
        total_adjustment: reb.total_adjustment,
        total_paid,
        total_refunded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn ledger(adjustment: &str, paid: &str, refunded: &str) -> RebookingLedger {
        RebookingLedger {
            total_adjustment: dec(adjustment),
            total_paid: dec(paid),
            total_refunded: dec(refunded),
        }
    }

    #[test]
    fn adjustment_is_exact_decimal_arithmetic() {
        assert_eq!(
            total_adjustment(dec("5000.00"), dec("6000.00"), dec("200.00")),
            dec("1200.00")
        );
        assert_eq!(
            total_adjustment(dec("6000.00"), dec("4000.00"), dec("0.00")),
            dec("-2000.00")
        );
        // No precision loss on awkward cent values
        assert_eq!(
            total_adjustment(dec("1234.56"), dec("1234.57"), dec("0.01")),
            dec("0.02")
        );
        assert_eq!(
            total_adjustment(dec("0.10"), dec("0.30"), dec("0.00")),
            dec("0.20")
        );
    }

    #[test]
    fn upgrade_owes_payment_until_covered() {
        let l = ledger("1200.00", "0.00", "0.00");
        assert_eq!(l.remaining_payment_due(), dec("1200.00"));
        assert_eq!(l.remaining_refund_due(), Decimal::ZERO);
        assert!(!l.is_payment_complete());

        let l = ledger("1200.00", "1200.00", "0.00");
        assert_eq!(l.remaining_payment_due(), Decimal::ZERO);
        assert!(l.is_payment_complete());
    }

    #[test]
    fn downgrade_owes_refund_until_covered() {
        let l = ledger("-2000.00", "0.00", "0.00");
        assert_eq!(l.remaining_refund_due(), dec("2000.00"));
        assert_eq!(l.remaining_payment_due(), Decimal::ZERO);
        assert!(!l.is_payment_complete());

        let l = ledger("-2000.00", "0.00", "2000.00");
        assert_eq!(l.remaining_refund_due(), Decimal::ZERO);
        assert!(l.is_payment_complete());
    }

    #[test]
    fn partial_coverage_leaves_the_difference() {
        let l = ledger("1200.00", "700.00", "0.00");
        assert_eq!(l.remaining_payment_due(), dec("500.00"));
        assert!(!l.is_payment_complete());

        let l = ledger("-2000.00", "0.00", "1500.00");
        assert_eq!(l.remaining_refund_due(), dec("500.00"));
        assert!(!l.is_payment_complete());
    }

    #[test]
    fn overcoverage_never_goes_negative() {
        let l = ledger("1200.00", "1500.00", "0.00");
        assert_eq!(l.remaining_payment_due(), Decimal::ZERO);
        assert!(l.is_payment_complete());

        let l = ledger("-2000.00", "0.00", "2500.00");
        assert_eq!(l.remaining_refund_due(), Decimal::ZERO);
        assert!(l.is_payment_complete());
    }

    #[test]
    fn zero_adjustment_is_always_complete() {
        // Paid/refunded amounts are irrelevant when nothing is owed
        for (paid, refunded) in [
            ("0.00", "0.00"),
            ("500.00", "0.00"),
            ("0.00", "500.00"),
            ("123.45", "678.90"),
        ] {
            let l = ledger("0.00", paid, refunded);
            assert!(l.is_payment_complete());
            assert_eq!(l.remaining_payment_due(), Decimal::ZERO);
            assert_eq!(l.remaining_refund_due(), Decimal::ZERO);
        }
    }

    #[test]
    fn at_most_one_direction_is_ever_due() {
        let cases = [
            ("1200.00", "0.00", "0.00"),
            ("1200.00", "600.00", "0.00"),
            ("1200.00", "1200.00", "0.00"),
            ("-2000.00", "0.00", "0.00"),
            ("-2000.00", "0.00", "999.99"),
            ("-2000.00", "0.00", "2000.00"),
            ("0.00", "100.00", "100.00"),
            ("0.01", "0.00", "0.00"),
            ("-0.01", "0.00", "0.00"),
        ];

        for (adjustment, paid, refunded) in cases {
            let l = ledger(adjustment, paid, refunded);
            let payment_due = l.remaining_payment_due();
            let refund_due = l.remaining_refund_due();

            assert!(
                payment_due.is_zero() || refund_due.is_zero(),
                "both directions due for adjustment={}",
                adjustment
            );
            if l.total_adjustment.is_zero() {
                assert!(payment_due.is_zero() && refund_due.is_zero());
            }
        }
    }

    #[test]
    fn exact_comparison_one_cent_short_is_incomplete() {
        let l = ledger("1200.00", "1199.99", "0.00");
        assert!(!l.is_payment_complete());
        assert_eq!(l.remaining_payment_due(), dec("0.01"));

        let l = ledger("-2000.00", "0.00", "1999.99");
        assert!(!l.is_payment_complete());
        assert_eq!(l.remaining_refund_due(), dec("0.01"));
    }
}
