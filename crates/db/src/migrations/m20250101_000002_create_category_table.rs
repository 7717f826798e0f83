//! Create category and `category_source` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Category::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Category::ShowId).string_len(32).not_null())
                    .col(ColumnDef::new(Category::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Category::Description).text())
                    .col(
                        ColumnDef::new(Category::CategoryType)
                            .string_len(20)
                            .not_null()
                            .default("standard"),
                    )
                    .col(
                        ColumnDef::new(Category::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Category::Revealed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Category::HideVoteCounts)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Category::WinnerOnly)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Category::RankingTop).integer())
                    .col(
                        ColumnDef::new(Category::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_show")
                            .from(Category::Table, Category::ShowId)
                            .to(Show::Table, Show::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_category_show_id")
                    .table(Category::Table)
                    .col(Category::ShowId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CategorySource::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CategorySource::AggregateId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CategorySource::SourceId)
                            .string_len(32)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(CategorySource::AggregateId)
                            .col(CategorySource::SourceId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_source_aggregate")
                            .from(CategorySource::Table, CategorySource::AggregateId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_category_source_source")
                            .from(CategorySource::Table, CategorySource::SourceId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Propagation looks aggregates up by source
        manager
            .create_index(
                Index::create()
                    .name("idx_category_source_source_id")
                    .table(CategorySource::Table)
                    .col(CategorySource::SourceId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CategorySource::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Category::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
    ShowId,
    Name,
    Description,
    CategoryType,
    IsActive,
    Revealed,
    HideVoteCounts,
    WinnerOnly,
    RankingTop,
    CreatedAt,
}

#[derive(Iden)]
enum CategorySource {
    Table,
    AggregateId,
    SourceId,
}

#[derive(Iden)]
enum Show {
    Table,
    Id,
}
