//! Create nomination table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Nomination::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Nomination::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Nomination::CategoryId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Nomination::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Nomination::Description).text())
                    .col(
                        ColumnDef::new(Nomination::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nomination_category")
                            .from(Nomination::Table, Nomination::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Aggregate rollup matches by (category, name)
        manager
            .create_index(
                Index::create()
                    .name("idx_nomination_category_name")
                    .table(Nomination::Table)
                    .col(Nomination::CategoryId)
                    .col(Nomination::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Nomination::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Nomination {
    Table,
    Id,
    CategoryId,
    Name,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}
