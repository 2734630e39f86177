use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260715_000001_create_users::User;
use super::m20260715_000002_create_accommodations::Accommodation;
use super::m20260715_000003_create_bookings::Booking;
use super::m20260715_000004_create_booking_items::EntranceFeeType;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(RebookingStatus::Enum)
                    .values([
                        RebookingStatus::Pending,
                        RebookingStatus::Approved,
                        RebookingStatus::Completed,
                        RebookingStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(RebookingPaymentStatus::Enum)
                    .values([
                        RebookingPaymentStatus::Pending,
                        RebookingPaymentStatus::Paid,
                        RebookingPaymentStatus::Refunded,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Rebooking::Table)
                    .if_not_exists()
                    .col(uuid(Rebooking::Id).primary_key())
                    .col(string_len(Rebooking::RebookingNumber, 20).not_null().unique_key())
                    .col(uuid(Rebooking::BookingId).not_null())
                    .col(date(Rebooking::NewCheckInDate).not_null())
                    .col(date_null(Rebooking::NewCheckOutDate))
                    .col(integer(Rebooking::NewAdults).not_null())
                    .col(integer(Rebooking::NewChildren).not_null())
                    .col(decimal_len(Rebooking::OriginalAmount, 10, 2).not_null())
                    .col(decimal_len(Rebooking::NewAmount, 10, 2).not_null())
                    .col(decimal_len(Rebooking::AmountDifference, 10, 2).not_null())
                    .col(decimal_len(Rebooking::RebookingFee, 10, 2).not_null())
                    .col(decimal_len(Rebooking::TotalAdjustment, 10, 2).not_null())
                    .col(
                        ColumnDef::new(Rebooking::Status)
                            .custom(RebookingStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rebooking::PaymentStatus)
                            .custom(RebookingPaymentStatus::Enum)
                            .not_null(),
                    )
                    .col(uuid_null(Rebooking::ProcessedBy))
                    .col(timestamp_with_time_zone_null(Rebooking::ApprovedAt))
                    .col(timestamp_with_time_zone_null(Rebooking::CompletedAt))
                    .col(
                        timestamp_with_time_zone(Rebooking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rebooking_booking")
                            .from(Rebooking::Table, Rebooking::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rebooking_processed_by")
                            .from(Rebooking::Table, Rebooking::ProcessedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RebookingAccommodation::Table)
                    .if_not_exists()
                    .col(uuid(RebookingAccommodation::Id).primary_key())
                    .col(uuid(RebookingAccommodation::RebookingId).not_null())
                    .col(integer(RebookingAccommodation::AccommodationId).not_null())
                    .col(integer(RebookingAccommodation::GuestCount).not_null())
                    .col(decimal_len(RebookingAccommodation::Rate, 10, 2).not_null())
                    .col(decimal_len(RebookingAccommodation::Subtotal, 10, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rebooking_accommodation_rebooking")
                            .from(
                                RebookingAccommodation::Table,
                                RebookingAccommodation::RebookingId,
                            )
                            .to(Rebooking::Table, Rebooking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rebooking_accommodation_accommodation")
                            .from(
                                RebookingAccommodation::Table,
                                RebookingAccommodation::AccommodationId,
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
                    .table(RebookingEntranceFee::Table)
                    .if_not_exists()
                    .col(uuid(RebookingEntranceFee::Id).primary_key())
                    .col(uuid(RebookingEntranceFee::RebookingId).not_null())
                    .col(
                        ColumnDef::new(RebookingEntranceFee::FeeType)
                            .custom(EntranceFeeType::Enum)
                            .not_null(),
                    )
                    .col(integer(RebookingEntranceFee::Quantity).not_null())
                    .col(decimal_len(RebookingEntranceFee::Rate, 10, 2).not_null())
                    .col(decimal_len(RebookingEntranceFee::Subtotal, 10, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rebooking_entrance_fee_rebooking")
                            .from(
                                RebookingEntranceFee::Table,
                                RebookingEntranceFee::RebookingId,
                            )
                            .to(Rebooking::Table, Rebooking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RebookingEntranceFee::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(RebookingAccommodation::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Rebooking::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(RebookingPaymentStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(RebookingStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Rebooking {
    Table,
    Id,
    RebookingNumber,
    BookingId,
    NewCheckInDate,
    NewCheckOutDate,
    NewAdults,
    NewChildren,
    OriginalAmount,
    NewAmount,
    AmountDifference,
    RebookingFee,
    TotalAdjustment,
    Status,
    PaymentStatus,
    ProcessedBy,
    ApprovedAt,
    CompletedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum RebookingAccommodation {
    Table,
    Id,
    RebookingId,
    AccommodationId,
    GuestCount,
    Rate,
    Subtotal,
}

#[derive(DeriveIden)]
pub enum RebookingEntranceFee {
    Table,
    Id,
    RebookingId,
    FeeType,
    Quantity,
    Rate,
    Subtotal,
}

#[derive(DeriveIden)]
pub enum RebookingStatus {
    #[sea_orm(iden = "rebooking_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "approved")]
    Approved,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}

#[derive(DeriveIden)]
pub enum RebookingPaymentStatus {
    #[sea_orm(iden = "rebooking_payment_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "paid")]
    Paid,
    #[sea_orm(iden = "refunded")]
    Refunded,
}
