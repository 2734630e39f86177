use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260715_000002_create_accommodations::Accommodation;
use super::m20260715_000003_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(EntranceFeeType::Enum)
                    .values([EntranceFeeType::Adult, EntranceFeeType::Child])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BookingAccommodation::Table)
                    .if_not_exists()
                    .col(uuid(BookingAccommodation::Id).primary_key())
                    .col(uuid(BookingAccommodation::BookingId).not_null())
                    .col(integer(BookingAccommodation::AccommodationId).not_null())
                    .col(integer(BookingAccommodation::GuestCount).not_null())
                    .col(decimal_len(BookingAccommodation::Rate, 10, 2).not_null())
                    .col(decimal_len(BookingAccommodation::Subtotal, 10, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_accommodation_booking")
                            .from(BookingAccommodation::Table, BookingAccommodation::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_accommodation_accommodation")
                            .from(
                                BookingAccommodation::Table,
                                BookingAccommodation::AccommodationId,
                            )
                            .to(Accommodation::Table, Accommodation::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BookingEntranceFee::Table)
                    .if_not_exists()
                    .col(uuid(BookingEntranceFee::Id).primary_key())
                    .col(uuid(BookingEntranceFee::BookingId).not_null())
                    .col(
                        ColumnDef::new(BookingEntranceFee::FeeType)
                            .custom(EntranceFeeType::Enum)
                            .not_null(),
                    )
                    .col(integer(BookingEntranceFee::Quantity).not_null())
                    .col(decimal_len(BookingEntranceFee::Rate, 10, 2).not_null())
                    .col(decimal_len(BookingEntranceFee::Subtotal, 10, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_entrance_fee_booking")
                            .from(BookingEntranceFee::Table, BookingEntranceFee::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingEntranceFee::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BookingAccommodation::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(EntranceFeeType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BookingAccommodation {
    Table,
    Id,
    BookingId,
    AccommodationId,
    GuestCount,
    Rate,
    Subtotal,
}

#[derive(DeriveIden)]
pub enum BookingEntranceFee {
    Table,
    Id,
    BookingId,
    FeeType,
    Quantity,
    Rate,
    Subtotal,
}

#[derive(DeriveIden)]
pub enum EntranceFeeType {
    #[sea_orm(iden = "entrance_fee_type")]
    Enum,
    #[sea_orm(iden = "adult")]
    Adult,
    #[sea_orm(iden = "child")]
    Child,
}
