use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260715_000001_create_users::User;
use super::m20260715_000003_create_bookings::Booking;
use super::m20260715_000005_create_rebookings::Rebooking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(PaymentMethod::Enum)
                    .values([
                        PaymentMethod::Cash,
                        PaymentMethod::Gcash,
                        PaymentMethod::BankTransfer,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(uuid(Payment::Id).primary_key())
                    .col(string_len(Payment::PaymentNumber, 20).not_null().unique_key())
                    .col(uuid(Payment::BookingId).not_null())
                    .col(uuid_null(Payment::RebookingId))
                    .col(decimal_len(Payment::Amount, 10, 2).not_null())
                    .col(
                        ColumnDef::new(Payment::Method)
                            .custom(PaymentMethod::Enum)
                            .not_null(),
                    )
                    .col(string_len_null(Payment::ReferenceNumber, 100))
                    .col(string_null(Payment::ReferenceImage))
                    .col(uuid(Payment::ReceivedBy).not_null())
                    .col(
                        timestamp_with_time_zone(Payment::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_booking")
                            .from(Payment::Table, Payment::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_rebooking")
                            .from(Payment::Table, Payment::RebookingId)
                            .to(Rebooking::Table, Rebooking::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_received_by")
                            .from(Payment::Table, Payment::ReceivedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Refund::Table)
                    .if_not_exists()
                    .col(uuid(Refund::Id).primary_key())
                    .col(string_len(Refund::RefundNumber, 20).not_null().unique_key())
                    .col(uuid(Refund::PaymentId).not_null())
                    .col(uuid_null(Refund::RebookingId))
                    .col(decimal_len(Refund::Amount, 10, 2).not_null())
                    .col(string_null(Refund::Reason))
                    .col(uuid(Refund::ProcessedBy).not_null())
                    .col(
                        timestamp_with_time_zone(Refund::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refund_payment")
                            .from(Refund::Table, Refund::PaymentId)
                            .to(Payment::Table, Payment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refund_rebooking")
                            .from(Refund::Table, Refund::RebookingId)
                            .to(Rebooking::Table, Rebooking::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_refund_processed_by")
                            .from(Refund::Table, Refund::ProcessedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Refund::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Payment::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(PaymentMethod::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Payment {
    Table,
    Id,
    PaymentNumber,
    BookingId,
    RebookingId,
    Amount,
    Method,
    ReferenceNumber,
    ReferenceImage,
    ReceivedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Refund {
    Table,
    Id,
    RefundNumber,
    PaymentId,
    RebookingId,
    Amount,
    Reason,
    ProcessedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum PaymentMethod {
    #[sea_orm(iden = "payment_method")]
    Enum,
    #[sea_orm(iden = "cash")]
    Cash,
    #[sea_orm(iden = "gcash")]
    Gcash,
    #[sea_orm(iden = "bank_transfer")]
    BankTransfer,
}
