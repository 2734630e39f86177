use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "booking_channel")]
pub enum BookingChannel {
    #[sea_orm(string_value = "guest")]
    Guest,
    #[sea_orm(string_value = "registered")]
    Registered,
    #[sea_orm(string_value = "walk_in")]
    WalkIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "rental_category")]
pub enum RentalCategory {
    #[sea_orm(string_value = "day_tour")]
    DayTour,
    #[sea_orm(string_value = "overnight")]
    Overnight,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "booking_status")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "checked_in")]
    CheckedIn,
    #[sea_orm(string_value = "checked_out")]
    CheckedOut,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    /// Statuses that hold their accommodations against new bookings.
    /// Cancelled and checked-out bookings never conflict.
    pub fn blocks_availability(&self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::CheckedIn
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::CheckedOut | BookingStatus::Cancelled)
    }

    /// Legal transitions: pending -> confirmed -> checked_in -> checked_out,
    /// with cancellation possible from pending/confirmed only.
    pub fn can_transition_to(&self, next: &BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::CheckedIn)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
                | (BookingStatus::CheckedIn, BookingStatus::CheckedOut)
        )
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub booking_number: String,
    pub channel: BookingChannel,
    pub category: RentalCategory,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub user_id: Option<Uuid>,
    pub check_in_date: Date,
    pub check_out_date: Option<Date>,
    pub adults: i32,
    pub children: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub accommodation_subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub entrance_fee_subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub paid_amount: Decimal,
    pub downpayment_required: bool,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub downpayment_amount: Option<Decimal>,
    pub status: BookingStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::booking_accommodation::Entity")]
    Accommodations,
    #[sea_orm(has_many = "super::booking_entrance_fee::Entity")]
    EntranceFees,
    #[sea_orm(has_many = "super::rebooking::Entity")]
    Rebookings,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::booking_accommodation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accommodations.def()
    }
}

impl Related<super::booking_entrance_fee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntranceFees.def()
    }
}

impl Related<super::rebooking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rebookings.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn total_guests(&self) -> i32 {
        self.adults + self.children
    }

    pub fn balance(&self) -> Decimal {
        self.total_amount - self.paid_amount
    }

    pub fn is_fully_paid(&self) -> bool {
        self.balance() <= Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn booking(total: &str, paid: &str) -> Model {
        Model {
            id: Uuid::new_v4(),
            booking_number: "BK-202506-0001".to_string(),
            channel: BookingChannel::Guest,
            category: RentalCategory::Overnight,
            guest_name: "Ana Reyes".to_string(),
            guest_email: "ana@example.com".to_string(),
            guest_phone: "09170000001".to_string(),
            user_id: None,
            check_in_date: Date::from_ymd_opt(2025, 6, 10).unwrap(),
            check_out_date: Date::from_ymd_opt(2025, 6, 12),
            adults: 2,
            children: 1,
            accommodation_subtotal: total.parse().unwrap(),
            entrance_fee_subtotal: Decimal::ZERO,
            total_amount: total.parse().unwrap(),
            paid_amount: paid.parse().unwrap(),
            downpayment_required: false,
            downpayment_amount: None,
            status: BookingStatus::Confirmed,
            created_by: None,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn transition_table() {
        use BookingStatus::*;

        assert!(Pending.can_transition_to(&Confirmed));
        assert!(Pending.can_transition_to(&Cancelled));
        assert!(Confirmed.can_transition_to(&CheckedIn));
        assert!(Confirmed.can_transition_to(&Cancelled));
        assert!(CheckedIn.can_transition_to(&CheckedOut));

        // No reactivation, no undo, no skipping
        assert!(!Cancelled.can_transition_to(&Pending));
        assert!(!Cancelled.can_transition_to(&Confirmed));
        assert!(!CheckedOut.can_transition_to(&CheckedIn));
        assert!(!CheckedOut.can_transition_to(&Cancelled));
        assert!(!CheckedIn.can_transition_to(&Cancelled));
        assert!(!Pending.can_transition_to(&CheckedIn));
        assert!(!Pending.can_transition_to(&CheckedOut));
    }

    #[test]
    fn terminal_states() {
        assert!(BookingStatus::CheckedOut.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(!BookingStatus::CheckedIn.is_terminal());
    }

    #[test]
    fn availability_blocking_statuses() {
        assert!(BookingStatus::Pending.blocks_availability());
        assert!(BookingStatus::Confirmed.blocks_availability());
        assert!(BookingStatus::CheckedIn.blocks_availability());
        assert!(!BookingStatus::CheckedOut.blocks_availability());
        assert!(!BookingStatus::Cancelled.blocks_availability());
    }

    #[test]
    fn balance_and_fully_paid() {
        let b = booking("5000.00", "2000.00");
        assert_eq!(b.balance(), "3000.00".parse::<Decimal>().unwrap());
        assert!(!b.is_fully_paid());

        let b = booking("5000.00", "5000.00");
        assert_eq!(b.balance(), Decimal::ZERO);
        assert!(b.is_fully_paid());

        // Overpayment still counts as fully paid
        let b = booking("5000.00", "5500.00");
        assert!(b.is_fully_paid());
    }

    #[test]
    fn total_guests_sums_adults_and_children() {
        let b = booking("1000.00", "0.00");
        assert_eq!(b.total_guests(), 3);
    }
}
