//! Category repository.

use std::sync::Arc;

use crate::entities::{
    Category, CategorySource, Nomination, Show, category, category::CategoryType, category_source,
    nomination,
};
use podium_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait, sea_query::Expr,
};

/// Independent boolean toggles on a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFlag {
    /// Results are shown to the audience.
    Revealed,
    /// Standings are shown without counts.
    HideVoteCounts,
    /// Only the leader is presented.
    WinnerOnly,
}

impl CategoryFlag {
    const fn column(self) -> category::Column {
        match self {
            Self::Revealed => category::Column::Revealed,
            Self::HideVoteCounts => category::Column::HideVoteCounts,
            Self::WinnerOnly => category::Column::WinnerOnly,
        }
    }
}

/// Category repository for database operations.
#[derive(Clone)]
pub struct CategoryRepository {
    db: Arc<DatabaseConnection>,
}

impl CategoryRepository {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a category by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<category::Model>> {
        Category::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a category by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<category::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category not found: {id}")))
    }

    /// Find categories by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<category::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Category::find()
            .filter(category::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a show's categories in creation order.
    pub async fn find_by_show(
        &self,
        show_id: &str,
        active_only: bool,
    ) -> AppResult<Vec<category::Model>> {
        let mut query = Category::find().filter(category::Column::ShowId.eq(show_id));
        if active_only {
            query = query.filter(category::Column::IsActive.eq(true));
        }

        query
            .order_by_asc(category::Column::CreatedAt)
            .order_by_asc(category::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a show's categories that may feed an aggregate.
    pub async fn find_source_candidates(&self, show_id: &str) -> AppResult<Vec<category::Model>> {
        Category::find()
            .filter(category::Column::ShowId.eq(show_id))
            .filter(category::Column::CategoryType.ne(CategoryType::Aggregate))
            .order_by_asc(category::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a category with its aggregate sources and materialised
    /// nominations as one unit.
    ///
    /// Source rows are locked before their nominations are read, so a
    /// nomination added to a source concurrently either commits first and
    /// is read here, or waits and then sees the new aggregate link.
    /// `materialise` turns the source nominations into the aggregate's own.
    pub async fn create<F>(
        &self,
        model: category::ActiveModel,
        source_ids: &[String],
        materialise: F,
    ) -> AppResult<category::Model>
    where
        F: FnOnce(&[nomination::Model]) -> Vec<nomination::ActiveModel> + Send,
    {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !source_ids.is_empty() {
            // Id order keeps concurrent aggregate creations from deadlocking.
            let locked = Category::find()
                .filter(category::Column::Id.is_in(source_ids.iter().cloned()))
                .order_by_asc(category::Column::Id)
                .lock_exclusive()
                .all(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if locked.len() != source_ids.len() {
                return Err(AppError::BadRequest(
                    "Source category not found".to_string(),
                ));
            }
        }

        let category = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !source_ids.is_empty() {
            let links = source_ids.iter().map(|source_id| category_source::ActiveModel {
                aggregate_id: Set(category.id.clone()),
                source_id: Set(source_id.clone()),
            });
            CategorySource::insert_many(links)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            let source_nominations = Nomination::find()
                .filter(nomination::Column::CategoryId.is_in(source_ids.iter().cloned()))
                .order_by_asc(nomination::Column::CreatedAt)
                .order_by_asc(nomination::Column::Id)
                .all(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            let nominations = materialise(&source_nominations);
            if !nominations.is_empty() {
                Nomination::insert_many(nominations)
                    .exec_without_returning(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(category)
    }

    /// IDs of the source categories an aggregate rolls up.
    pub async fn find_source_ids(&self, aggregate_id: &str) -> AppResult<Vec<String>> {
        CategorySource::find()
            .select_only()
            .column(category_source::Column::SourceId)
            .filter(category_source::Column::AggregateId.eq(aggregate_id))
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Source categories of an aggregate.
    pub async fn find_sources(&self, aggregate_id: &str) -> AppResult<Vec<category::Model>> {
        let ids = self.find_source_ids(aggregate_id).await?;
        self.find_by_ids(&ids).await
    }

    /// Flip the active state of a category.
    ///
    /// An active category is simply deactivated. Otherwise every other
    /// category of the show is deactivated and this one activated, in one
    /// transaction holding the show row lock so concurrent activations in
    /// the same show serialize.
    pub async fn toggle_active(&self, id: &str) -> AppResult<category::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let show_id = Category::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Category not found: {id}")))?
            .show_id;

        Show::find_by_id(&show_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Re-read under the lock; a racing activation may have committed.
        let category = Category::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Category not found: {id}")))?;

        let activate = !category.is_active;
        if activate {
            Category::update_many()
                .col_expr(category::Column::IsActive, Expr::value(false))
                .filter(category::Column::ShowId.eq(&show_id))
                .filter(category::Column::IsActive.eq(true))
                .exec(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        let mut active: category::ActiveModel = category.into();
        active.is_active = Set(activate);
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(updated)
    }

    /// Flip one presentation flag in place.
    pub async fn toggle_flag(&self, id: &str, flag: CategoryFlag) -> AppResult<category::Model> {
        let column = flag.column();
        let result = Category::update_many()
            .col_expr(column, Expr::col(column).not())
            .filter(category::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Category not found: {id}")));
        }

        self.get_by_id(id).await
    }

    /// Delete a category; its nominations, ballots and source links cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Category::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Category not found: {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::show;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_category(id: &str, show_id: &str, is_active: bool) -> category::Model {
        category::Model {
            id: id.to_string(),
            show_id: show_id.to_string(),
            name: "Best Costume".to_string(),
            description: None,
            category_type: CategoryType::Standard,
            is_active,
            revealed: false,
            hide_vote_counts: false,
            winner_only: false,
            ranking_top: None,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_show(id: &str) -> show::Model {
        show::Model {
            id: id.to_string(),
            slug: "office-awards".to_string(),
            name: "Office Awards".to_string(),
            password: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_vanished_source() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_category("a", "show1", false)]])
                .into_connection(),
        );

        let mut aggregate = create_test_category("agg", "show1", false);
        aggregate.category_type = CategoryType::Aggregate;

        let repo = CategoryRepository::new(db);
        let result = repo
            .create(
                aggregate.into(),
                &["a".to_string(), "b".to_string()],
                |_| Vec::new(),
            )
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_toggle_active_deactivates_active_category() {
        let current = create_test_category("cat1", "show1", true);
        let deactivated = create_test_category("cat1", "show1", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[current.clone()]])
                .append_query_results([[create_test_show("show1")]])
                .append_query_results([[current]])
                .append_query_results([[deactivated]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.toggle_active("cat1").await.unwrap();

        assert!(!result.is_active);
    }

    #[tokio::test]
    async fn test_toggle_active_activates_exclusively() {
        let current = create_test_category("cat2", "show1", false);
        let activated = create_test_category("cat2", "show1", true);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[current.clone()]])
                .append_query_results([[create_test_show("show1")]])
                .append_query_results([[current]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[activated]])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.toggle_active("cat2").await.unwrap();

        assert!(result.is_active);
        assert_eq!(result.show_id, "show1");
    }

    #[tokio::test]
    async fn test_toggle_active_missing_category() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.toggle_active("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_toggle_flag_missing_category() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CategoryRepository::new(db);
        let result = repo.toggle_flag("missing", CategoryFlag::Revealed).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
