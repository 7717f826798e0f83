//! Nomination repository.

use std::sync::Arc;

use crate::entities::{
    Category, CategorySource, Nomination, category, category_source, nomination,
};
use podium_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

/// Nomination repository for database operations.
#[derive(Clone)]
pub struct NominationRepository {
    db: Arc<DatabaseConnection>,
}

impl NominationRepository {
    /// Create a new nomination repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a nomination by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<nomination::Model>> {
        Nomination::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a nomination by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<nomination::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Nomination not found: {id}")))
    }

    /// Get a nomination together with the category it belongs to.
    pub async fn get_with_category(
        &self,
        id: &str,
    ) -> AppResult<(nomination::Model, category::Model)> {
        let found = Nomination::find_by_id(id)
            .find_also_related(Category)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match found {
            Some((nomination, Some(category))) => Ok((nomination, category)),
            _ => Err(AppError::NotFound(format!("Nomination not found: {id}"))),
        }
    }

    /// List a category's nominations in creation order.
    pub async fn find_by_category(&self, category_id: &str) -> AppResult<Vec<nomination::Model>> {
        Nomination::find()
            .filter(nomination::Column::CategoryId.eq(category_id))
            .order_by_asc(nomination::Column::CreatedAt)
            .order_by_asc(nomination::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List the nominations of several categories in creation order.
    pub async fn find_by_categories(
        &self,
        category_ids: &[String],
    ) -> AppResult<Vec<nomination::Model>> {
        if category_ids.is_empty() {
            return Ok(vec![]);
        }

        Nomination::find()
            .filter(nomination::Column::CategoryId.is_in(category_ids.iter().cloned()))
            .order_by_asc(nomination::Column::CreatedAt)
            .order_by_asc(nomination::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a nomination and mirror it into aggregate categories.
    ///
    /// The nomination's category is locked before its aggregates are looked
    /// up, which orders this insert against a concurrent aggregate creation
    /// over the same category. `mirror` builds the row for one aggregate ID;
    /// it is inserted only when that aggregate has no nomination of the same
    /// name yet, checked under the aggregate's row lock.
    pub async fn create_with_mirrors<F>(
        &self,
        model: nomination::ActiveModel,
        mirror: F,
    ) -> AppResult<(nomination::Model, Vec<nomination::Model>)>
    where
        F: Fn(&str) -> nomination::ActiveModel + Send,
    {
        let category_id = model
            .category_id
            .try_as_ref()
            .cloned()
            .ok_or_else(|| AppError::Internal("Nomination has no category".to_string()))?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Category::find_by_id(&category_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Category not found: {category_id}")))?;

        let aggregate_ids: Vec<String> = CategorySource::find()
            .select_only()
            .column(category_source::Column::AggregateId)
            .filter(category_source::Column::SourceId.eq(&category_id))
            .order_by_asc(category_source::Column::AggregateId)
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let created = model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut mirrored = Vec::with_capacity(aggregate_ids.len());
        for aggregate_id in &aggregate_ids {
            Category::find_by_id(aggregate_id)
                .lock_exclusive()
                .one(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            let existing = Nomination::find()
                .filter(nomination::Column::CategoryId.eq(aggregate_id))
                .filter(nomination::Column::Name.eq(&created.name))
                .count(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            if existing == 0 {
                let inserted = mirror(aggregate_id)
                    .insert(&txn)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                mirrored.push(inserted);
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((created, mirrored))
    }

    /// Delete a nomination; its ballots cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Nomination::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Nomination not found: {id}")));
        }
        Ok(())
    }
}
