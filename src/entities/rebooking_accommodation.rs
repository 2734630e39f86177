use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "rebooking_accommodation")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub rebooking_id: Uuid,
    pub accommodation_id: i32,
    pub guest_count: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub rate: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub subtotal: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::rebooking::Entity",
        from = "Column::RebookingId",
        to = "super::rebooking::Column::Id"
    )]
    Rebooking,
    #[sea_orm(
        belongs_to = "super::accommodation::Entity",
        from = "Column::AccommodationId",
        to = "super::accommodation::Column::Id"
    )]
    Accommodation,
}

impl Related<super::rebooking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rebooking.def()
    }
}

impl Related<super::accommodation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accommodation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
