use chrono::{Datelike, NaiveDate};
use sea_orm::{ConnectionTrait, DbBackend, Statement};

use crate::error::{AppError, AppResult};

/// Business-number families. Each gets its own per-month counter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Booking,
    Payment,
    Rebooking,
    Refund,
}

impl SequenceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            SequenceKind::Booking => "BK",
            SequenceKind::Payment => "PAY",
            SequenceKind::Rebooking => "RBK",
            SequenceKind::Refund => "RFD",
        }
    }

    fn scope(&self) -> &'static str {
        match self {
            SequenceKind::Booking => "booking",
            SequenceKind::Payment => "payment",
            SequenceKind::Rebooking => "rebooking",
            SequenceKind::Refund => "refund",
        }
    }
}

/// Counter period: calendar month of the given date, as `YYYYMM`.
pub fn period_for(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

pub fn format_number(kind: SequenceKind, period: &str, sequence: i32) -> String {
    format!("{}-{}-{:04}", kind.prefix(), period, sequence)
}

/// Allocate the next business number for the kind's counter in the month of
/// `date`. The upsert increments atomically, so concurrent creations within
/// a period each get a distinct sequence value.
pub async fn next_number<C: ConnectionTrait>(
    conn: &C,
    kind: SequenceKind,
    date: NaiveDate,
) -> AppResult<String> {
    let period = period_for(date);

    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"INSERT INTO sequence_counter (scope, period, value)
           VALUES ($1, $2, 1)
           ON CONFLICT (scope, period)
           DO UPDATE SET value = sequence_counter.value + 1
           RETURNING value"#,
        [kind.scope().into(), period.clone().into()],
    );

    let row = conn
        .query_one(stmt)
        .await?
        .ok_or_else(|| AppError::Internal("sequence counter upsert returned no row".to_string()))?;
    let value: i32 = row.try_get("", "value")?;

    Ok(format_number(kind, &period, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn period_is_year_and_zero_padded_month() {
        assert_eq!(period_for(d(2025, 6, 15)), "202506");
        assert_eq!(period_for(d(2025, 12, 1)), "202512");
        assert_eq!(period_for(d(2026, 1, 31)), "202601");
    }

    #[test]
    fn numbers_carry_prefix_period_and_padded_sequence() {
        assert_eq!(
            format_number(SequenceKind::Booking, "202506", 1),
            "BK-202506-0001"
        );
        assert_eq!(
            format_number(SequenceKind::Payment, "202506", 42),
            "PAY-202506-0042"
        );
        assert_eq!(
            format_number(SequenceKind::Rebooking, "202512", 999),
            "RBK-202512-0999"
        );
        assert_eq!(
            format_number(SequenceKind::Refund, "202601", 1000),
            "RFD-202601-1000"
        );
    }

    #[test]
    fn padding_does_not_truncate_large_sequences() {
        assert_eq!(
            format_number(SequenceKind::Booking, "202506", 12345),
            "BK-202506-12345"
        );
    }
}
