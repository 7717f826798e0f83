//! Show repository.

use std::sync::Arc;

use crate::entities::{Show, show};
use crate::is_unique_violation;
use podium_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Show repository for database operations.
#[derive(Clone)]
pub struct ShowRepository {
    db: Arc<DatabaseConnection>,
}

/// Public listing entry for a show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowListing {
    /// Public slug.
    pub slug: String,
    /// Last modification time.
    pub updated_at: chrono::DateTime<chrono::FixedOffset>,
}

impl ShowRepository {
    /// Create a new show repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a show by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<show::Model>> {
        Show::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a show by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<show::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Show not found: {id}")))
    }

    /// Find a show by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<show::Model>> {
        Show::find()
            .filter(show::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a show by slug, returning error if not found.
    pub async fn get_by_slug(&self, slug: &str) -> AppResult<show::Model> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Show not found: {slug}")))
    }

    /// Create a new show.
    ///
    /// A slug collision surfaces as [`AppError::Conflict`].
    pub async fn create(&self, model: show::ActiveModel) -> AppResult<show::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("That URL is already in use. Please try another one".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// List every show's slug, most recently updated first.
    pub async fn list_recent(&self) -> AppResult<Vec<ShowListing>> {
        let rows: Vec<(String, chrono::DateTime<chrono::FixedOffset>)> = Show::find()
            .select_only()
            .column(show::Column::Slug)
            .column(show::Column::UpdatedAt)
            .order_by_desc(show::Column::UpdatedAt)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(slug, updated_at)| ShowListing { slug, updated_at })
            .collect())
    }

    /// Delete a show; categories, nominations and ballots cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Show::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Show not found: {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_show(id: &str, slug: &str) -> show::Model {
        show::Model {
            id: id.to_string(),
            slug: slug.to_string(),
            name: "Office Awards".to_string(),
            password: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_slug() {
        let show = create_test_show("show1", "office-awards");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[show.clone()]])
                .into_connection(),
        );

        let repo = ShowRepository::new(db);
        let result = repo.get_by_slug("office-awards").await.unwrap();

        assert_eq!(result.id, "show1");
    }

    #[tokio::test]
    async fn test_get_by_slug_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<show::Model>::new()])
                .into_connection(),
        );

        let repo = ShowRepository::new(db);
        let result = repo.get_by_slug("missing").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_show() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ShowRepository::new(db);
        let result = repo.delete("show1").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
