//! Ballot repository.

use std::sync::Arc;

use crate::entities::{Ballot, Category, Nomination, ballot, category, nomination};
use crate::is_unique_violation;
use podium_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait, sea_query::Expr,
};

/// Attempts made when a concurrent replacement trips a uniqueness index.
const MAX_REPLACE_ATTEMPTS: u32 = 3;

/// Transaction-scoped lock serializing writes for one device in one category.
const DEVICE_CATEGORY_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtext($1))";

/// Ballot counts for one nomination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominationBallotStats {
    /// Nomination the ballots were cast for.
    pub nomination_id: String,
    /// Number of ballots.
    pub ballots: i64,
    /// Sum of ranks over ranked ballots, zero when none are ranked.
    pub rank_sum: i64,
}

/// Ballot repository for database operations.
#[derive(Clone)]
pub struct BallotRepository {
    db: Arc<DatabaseConnection>,
}

impl BallotRepository {
    /// Create a new ballot repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// A device's ballots in a category, ordered by rank.
    pub async fn find_by_device(
        &self,
        device_id: &str,
        category_id: &str,
    ) -> AppResult<Vec<ballot::Model>> {
        Ballot::find()
            .filter(ballot::Column::DeviceId.eq(device_id))
            .filter(ballot::Column::CategoryId.eq(category_id))
            .order_by_asc(ballot::Column::Rank)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A device's ballots in a category together with their nominations.
    pub async fn find_by_device_with_nominations(
        &self,
        device_id: &str,
        category_id: &str,
    ) -> AppResult<Vec<(ballot::Model, nomination::Model)>> {
        let rows = Ballot::find()
            .filter(ballot::Column::DeviceId.eq(device_id))
            .filter(ballot::Column::CategoryId.eq(category_id))
            .order_by_asc(ballot::Column::Rank)
            .find_also_related(Nomination)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(ballot, nomination)| nomination.map(|n| (ballot, n)))
            .collect())
    }

    /// Whether a device has any ballot in a category.
    pub async fn has_voted(&self, device_id: &str, category_id: &str) -> AppResult<bool> {
        let count = Ballot::find()
            .filter(ballot::Column::DeviceId.eq(device_id))
            .filter(ballot::Column::CategoryId.eq(category_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(count > 0)
    }

    /// Replace every ballot a device holds in a category with `ballots`.
    ///
    /// The delete and insert commit together under an advisory lock keyed by
    /// device and category, so replacements from one device run one after
    /// another and the later writer prevails. A uniqueness violation that
    /// still slips through is retried, and reported as `Conflict` once the
    /// attempts run out.
    pub async fn replace_for_device(
        &self,
        device_id: &str,
        category_id: &str,
        ballots: Vec<ballot::ActiveModel>,
    ) -> AppResult<()> {
        let mut attempt = 1;
        loop {
            match self
                .try_replace(device_id, category_id, ballots.clone())
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if is_unique_violation(&e) && attempt < MAX_REPLACE_ATTEMPTS => {
                    tracing::debug!(
                        device_id = %device_id,
                        category_id = %category_id,
                        attempt,
                        "Ballot replacement raced another write, retrying"
                    );
                    attempt += 1;
                }
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(
                        device_id = %device_id,
                        category_id = %category_id,
                        "Ballot replacement kept racing, giving up"
                    );
                    return Err(AppError::Conflict(
                        "Another submission for this category is in progress".to_string(),
                    ));
                }
                Err(e) => return Err(AppError::Database(e.to_string())),
            }
        }
    }

    async fn try_replace(
        &self,
        device_id: &str,
        category_id: &str,
        ballots: Vec<ballot::ActiveModel>,
    ) -> Result<(), DbErr> {
        let txn = self.db.begin().await?;

        txn.execute(Statement::from_sql_and_values(
            txn.get_database_backend(),
            DEVICE_CATEGORY_LOCK_SQL,
            [format!("{device_id}:{category_id}").into()],
        ))
        .await?;

        Ballot::delete_many()
            .filter(ballot::Column::DeviceId.eq(device_id))
            .filter(ballot::Column::CategoryId.eq(category_id))
            .exec(&txn)
            .await?;

        if !ballots.is_empty() {
            Ballot::insert_many(ballots)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await
    }

    /// Per-nomination ballot counts and rank sums for a category.
    ///
    /// Nominations without ballots are absent from the result.
    pub async fn stats_by_category(
        &self,
        category_id: &str,
    ) -> AppResult<Vec<NominationBallotStats>> {
        let rows: Vec<(i64, String, Option<i64>)> = Ballot::find()
            .select_only()
            .column_as(Expr::col(ballot::Column::Id).count(), "ballots")
            .column(ballot::Column::NominationId)
            .column_as(Expr::col(ballot::Column::Rank).sum(), "rank_sum")
            .filter(ballot::Column::CategoryId.eq(category_id))
            .group_by(ballot::Column::NominationId)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(ballots, nomination_id, rank_sum)| NominationBallotStats {
                nomination_id,
                ballots,
                rank_sum: rank_sum.unwrap_or(0),
            })
            .collect())
    }

    /// Delete every ballot in a category.
    pub async fn delete_by_category(&self, category_id: &str) -> AppResult<u64> {
        let result = Ballot::delete_many()
            .filter(ballot::Column::CategoryId.eq(category_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete every ballot in every category of a show.
    pub async fn delete_by_show(&self, show_id: &str) -> AppResult<u64> {
        let category_ids: Vec<String> = Category::find()
            .select_only()
            .column(category::Column::Id)
            .filter(category::Column::ShowId.eq(show_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if category_ids.is_empty() {
            return Ok(0);
        }

        let result = Ballot::delete_many()
            .filter(ballot::Column::CategoryId.is_in(category_ids))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_ballot(id: &str, nomination_id: &str, rank: Option<i32>) -> ballot::Model {
        ballot::Model {
            id: id.to_string(),
            nomination_id: nomination_id.to_string(),
            category_id: "cat1".to_string(),
            device_id: "device1".to_string(),
            rank,
            created_at: Utc::now().into(),
        }
    }

    fn exec_result(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    #[tokio::test]
    async fn test_has_voted() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );

        let repo = BallotRepository::new(db);
        assert!(repo.has_voted("device1", "cat1").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_device_ordered() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_ballot("b1", "nom1", Some(1)),
                    create_test_ballot("b2", "nom2", Some(2)),
                ]])
                .into_connection(),
        );

        let repo = BallotRepository::new(db);
        let ballots = repo.find_by_device("device1", "cat1").await.unwrap();

        assert_eq!(ballots.len(), 2);
        assert_eq!(ballots[0].rank, Some(1));
    }

    #[tokio::test]
    async fn test_replace_for_device() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec_result(1), exec_result(1), exec_result(1)])
                .into_connection(),
        );

        let repo = BallotRepository::new(Arc::clone(&db));
        let ballot = ballot::ActiveModel {
            id: Set("b3".to_string()),
            nomination_id: Set("nom2".to_string()),
            category_id: Set("cat1".to_string()),
            device_id: Set("device1".to_string()),
            rank: Set(None),
            created_at: Set(Utc::now().into()),
        };

        repo.replace_for_device("device1", "cat1", vec![ballot])
            .await
            .unwrap();
        drop(repo);

        // The advisory lock is taken before the old ballots are deleted.
        let log = format!(
            "{:?}",
            Arc::try_unwrap(db).unwrap().into_transaction_log()
        );
        let lock = log.find("pg_advisory_xact_lock").unwrap();
        let delete = log.find("DELETE FROM").unwrap();
        assert!(lock < delete);
        assert!(log.contains("device1:cat1"));
    }

    #[tokio::test]
    async fn test_delete_by_show_without_categories() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );

        let repo = BallotRepository::new(db);
        assert_eq!(repo.delete_by_show("show1").await.unwrap(), 0);
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        std::collections::BTreeMap::from([("num_items", n.into())])
    }
}
