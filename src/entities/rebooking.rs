use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "rebooking_status")]
pub enum RebookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl RebookingStatus {
    /// A rebooking still in play for conflict checking and for the
    /// one-active-rebooking-per-booking rule.
    pub fn is_active(&self) -> bool {
        matches!(self, RebookingStatus::Pending | RebookingStatus::Approved)
    }

    pub fn can_transition_to(&self, next: &RebookingStatus) -> bool {
        matches!(
            (self, next),
            (RebookingStatus::Pending, RebookingStatus::Approved)
                | (RebookingStatus::Pending, RebookingStatus::Cancelled)
                | (RebookingStatus::Approved, RebookingStatus::Completed)
                | (RebookingStatus::Approved, RebookingStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "rebooking_payment_status"
)]
pub enum RebookingPaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rebooking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub rebooking_number: String,
    pub booking_id: Uuid,
    pub new_check_in_date: Date,
    pub new_check_out_date: Option<Date>,
    pub new_adults: i32,
    pub new_children: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub original_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub new_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub amount_difference: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub rebooking_fee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_adjustment: Decimal,
    pub status: RebookingStatus,
    pub payment_status: RebookingPaymentStatus,
    pub processed_by: Option<Uuid>,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::Id"
    )]
    Booking,
    #[sea_orm(has_many = "super::rebooking_accommodation::Entity")]
    Accommodations,
    #[sea_orm(has_many = "super::rebooking_entrance_fee::Entity")]
    EntranceFees,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    #[sea_orm(has_many = "super::refund::Entity")]
    Refunds,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl Related<super::rebooking_accommodation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accommodations.def()
    }
}

impl Related<super::rebooking_entrance_fee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EntranceFees.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::refund::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Refunds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_statuses() {
        assert!(RebookingStatus::Pending.is_active());
        assert!(RebookingStatus::Approved.is_active());
        assert!(!RebookingStatus::Completed.is_active());
        assert!(!RebookingStatus::Cancelled.is_active());
    }

    #[test]
    fn transition_table() {
        use RebookingStatus::*;

        assert!(Pending.can_transition_to(&Approved));
        assert!(Pending.can_transition_to(&Cancelled));
        assert!(Approved.can_transition_to(&Completed));
        assert!(Approved.can_transition_to(&Cancelled));

        assert!(!Pending.can_transition_to(&Completed));
        assert!(!Completed.can_transition_to(&Cancelled));
        assert!(!Cancelled.can_transition_to(&Pending));
        assert!(!Completed.can_transition_to(&Approved));
    }
}
