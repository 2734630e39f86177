use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accommodation::Table)
                    .if_not_exists()
                    .col(integer(Accommodation::Id).auto_increment().primary_key())
                    .col(string_len(Accommodation::Name, 100).not_null().unique_key())
                    .col(string_null(Accommodation::Description))
                    .col(integer(Accommodation::Capacity).not_null())
                    .col(decimal_len(Accommodation::DayTourRate, 10, 2).not_null())
                    .col(decimal_len(Accommodation::OvernightRate, 10, 2).not_null())
                    .col(boolean(Accommodation::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(Accommodation::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accommodation::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Accommodation {
    Table,
    Id,
    Name,
    Description,
    Capacity,
    DayTourRate,
    OvernightRate,
    IsActive,
    CreatedAt,
}
