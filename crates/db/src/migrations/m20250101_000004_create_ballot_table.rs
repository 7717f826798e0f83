//! Create ballot table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ballot::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ballot::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Ballot::NominationId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Ballot::CategoryId).string_len(32).not_null())
                    .col(ColumnDef::new(Ballot::DeviceId).string_len(64).not_null())
                    .col(ColumnDef::new(Ballot::Rank).integer())
                    .col(
                        ColumnDef::new(Ballot::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ballot_nomination")
                            .from(Ballot::Table, Ballot::NominationId)
                            .to(Nomination::Table, Nomination::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ballot_category")
                            .from(Ballot::Table, Ballot::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ballot_nomination_id")
                    .table(Ballot::Table)
                    .col(Ballot::NominationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ballot_category_device")
                    .table(Ballot::Table)
                    .col(Ballot::CategoryId)
                    .col(Ballot::DeviceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ballot::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Ballot {
    Table,
    Id,
    NominationId,
    CategoryId,
    DeviceId,
    Rank,
    CreatedAt,
}

#[derive(Iden)]
enum Nomination {
    Table,
    Id,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}
