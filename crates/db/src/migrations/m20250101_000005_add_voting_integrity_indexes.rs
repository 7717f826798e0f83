//! Partial unique indexes backing the one-active-category and
//! one-ballot-per-device invariants.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_category_single_active
                ON category (show_id)
                WHERE is_active;
                ",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_ballot_single_choice
                ON ballot (device_id, category_id)
                WHERE rank IS NULL;
                ",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_ballot_ranked
                ON ballot (device_id, category_id, rank)
                WHERE rank IS NOT NULL;
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r"
                DROP INDEX IF EXISTS idx_ballot_ranked;
                DROP INDEX IF EXISTS idx_ballot_single_choice;
                DROP INDEX IF EXISTS idx_category_single_active;
                ",
            )
            .await?;

        Ok(())
    }
}
