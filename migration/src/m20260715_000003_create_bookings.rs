use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260715_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(BookingChannel::Enum)
                    .values([
                        BookingChannel::Guest,
                        BookingChannel::Registered,
                        BookingChannel::WalkIn,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(RentalCategory::Enum)
                    .values([RentalCategory::DayTour, RentalCategory::Overnight])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(BookingStatus::Enum)
                    .values([
                        BookingStatus::Pending,
                        BookingStatus::Confirmed,
                        BookingStatus::CheckedIn,
                        BookingStatus::CheckedOut,
                        BookingStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(string_len(Booking::BookingNumber, 20).not_null().unique_key())
                    .col(
                        ColumnDef::new(Booking::Channel)
                            .custom(BookingChannel::Enum)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Booking::Category)
                            .custom(RentalCategory::Enum)
                            .not_null(),
                    )
                    .col(string_len(Booking::GuestName, 100).not_null())
                    .col(string_len(Booking::GuestEmail, 255).not_null())
                    .col(string_len(Booking::GuestPhone, 30).not_null())
                    .col(uuid_null(Booking::UserId))
                    .col(date(Booking::CheckInDate).not_null())
                    .col(date_null(Booking::CheckOutDate))
                    .col(integer(Booking::Adults).not_null())
                    .col(integer(Booking::Children).not_null())
                    .col(decimal_len(Booking::AccommodationSubtotal, 10, 2).not_null())
                    .col(decimal_len(Booking::EntranceFeeSubtotal, 10, 2).not_null())
                    .col(decimal_len(Booking::TotalAmount, 10, 2).not_null())
                    .col(decimal_len(Booking::PaidAmount, 10, 2).not_null().default(0))
                    .col(boolean(Booking::DownpaymentRequired).not_null().default(false))
                    .col(decimal_len_null(Booking::DownpaymentAmount, 10, 2))
                    .col(
                        ColumnDef::new(Booking::Status)
                            .custom(BookingStatus::Enum)
                            .not_null(),
                    )
                    .col(uuid_null(Booking::CreatedBy))
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_user")
                            .from(Booking::Table, Booking::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_created_by")
                            .from(Booking::Table, Booking::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(RentalCategory::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingChannel::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    BookingNumber,
    Channel,
    Category,
    GuestName,
    GuestEmail,
    GuestPhone,
    UserId,
    CheckInDate,
    CheckOutDate,
    Adults,
    Children,
    AccommodationSubtotal,
    EntranceFeeSubtotal,
    TotalAmount,
    PaidAmount,
    DownpaymentRequired,
    DownpaymentAmount,
    Status,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum BookingChannel {
    #[sea_orm(iden = "booking_channel")]
    Enum,
    #[sea_orm(iden = "guest")]
    Guest,
    #[sea_orm(iden = "registered")]
    Registered,
    #[sea_orm(iden = "walk_in")]
    WalkIn,
}

#[derive(DeriveIden)]
pub enum RentalCategory {
    #[sea_orm(iden = "rental_category")]
    Enum,
    #[sea_orm(iden = "day_tour")]
    DayTour,
    #[sea_orm(iden = "overnight")]
    Overnight,
}

#[derive(DeriveIden)]
pub enum BookingStatus {
    #[sea_orm(iden = "booking_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "confirmed")]
    Confirmed,
    #[sea_orm(iden = "checked_in")]
    CheckedIn,
    #[sea_orm(iden = "checked_out")]
    CheckedOut,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}
