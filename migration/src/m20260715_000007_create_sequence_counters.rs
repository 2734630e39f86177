use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SequenceCounter::Table)
                    .if_not_exists()
                    .col(string_len(SequenceCounter::Scope, 20).not_null())
                    .col(string_len(SequenceCounter::Period, 6).not_null())
                    .col(integer(SequenceCounter::Value).not_null())
                    .primary_key(
                        Index::create()
                            .col(SequenceCounter::Scope)
                            .col(SequenceCounter::Period),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SequenceCounter::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum SequenceCounter {
    Table,
    Scope,
    Period,
    Value,
}
