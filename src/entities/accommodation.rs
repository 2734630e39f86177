use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accommodation")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
    pub capacity: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub day_tour_rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub overnight_rate: Decimal,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking_accommodation::Entity")]
    BookingAccommodations,
}

impl Related<super::booking_accommodation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookingAccommodations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rate applicable to the given rental category.
    pub fn rate_for(&self, category: &super::booking::RentalCategory) -> Decimal {
        match category {
            super::booking::RentalCategory::DayTour => self.day_tour_rate,
            super::booking::RentalCategory::Overnight => self.overnight_rate,
        }
    }
}
