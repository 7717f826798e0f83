//! Nomination service.

use chrono::Utc;
use podium_common::{AppError, AppResult, IdGenerator};
use podium_db::{
    entities::{category, category::CategoryType, nomination},
    repositories::{CategoryRepository, NominationRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::aggregate::AggregateService;

/// Input for adding a nomination.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNominationInput {
    pub category_id: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Free text, or an image reference for image categories.
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Nomination service for organizer operations.
#[derive(Clone)]
pub struct NominationService {
    nomination_repo: NominationRepository,
    category_repo: CategoryRepository,
    aggregate: AggregateService,
    id_gen: IdGenerator,
}

impl NominationService {
    /// Create a new nomination service.
    #[must_use]
    pub const fn new(
        nomination_repo: NominationRepository,
        category_repo: CategoryRepository,
        aggregate: AggregateService,
    ) -> Self {
        Self {
            nomination_repo,
            category_repo,
            aggregate,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a nomination, mirroring it into every aggregate fed by its
    /// category.
    pub async fn add_nomination(&self, input: CreateNominationInput) -> AppResult<nomination::Model> {
        input.validate()?;
        let category = self.category_repo.get_by_id(&input.category_id).await?;

        if category.category_type == CategoryType::Aggregate {
            return Err(AppError::BadRequest(
                "Aggregate categories take their nominations from source categories".to_string(),
            ));
        }

        let description = input.description.filter(|d| !d.is_empty());
        let model = nomination::ActiveModel {
            id: Set(self.id_gen.generate()),
            category_id: Set(category.id),
            name: Set(input.name.clone()),
            description: Set(description.clone()),
            created_at: Set(Utc::now().into()),
        };

        let (nomination, mirrored) = self
            .nomination_repo
            .create_with_mirrors(model, |aggregate_id| {
                self.aggregate
                    .mirror(aggregate_id, &input.name, description.as_deref())
            })
            .await?;

        tracing::info!(
            nomination_id = %nomination.id,
            category_id = %nomination.category_id,
            mirrored = mirrored.len(),
            "Nomination created"
        );
        Ok(nomination)
    }

    /// Get a nomination together with its category.
    pub async fn get_with_category(
        &self,
        id: &str,
    ) -> AppResult<(nomination::Model, category::Model)> {
        self.nomination_repo.get_with_category(id).await
    }

    /// Delete a nomination and its ballots.
    pub async fn delete_nomination(&self, id: &str) -> AppResult<()> {
        self.nomination_repo.delete(id).await?;
        tracing::info!(nomination_id = %id, "Nomination deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn category(category_type: CategoryType) -> category::Model {
        category::Model {
            id: "cat1".to_string(),
            show_id: "show1".to_string(),
            name: "Best Costume".to_string(),
            description: None,
            category_type,
            is_active: false,
            revealed: false,
            hide_vote_counts: false,
            winner_only: false,
            ranking_top: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> NominationService {
        let db = Arc::new(db);
        let category_repo = CategoryRepository::new(db.clone());
        let nomination_repo = NominationRepository::new(db);
        let aggregate = AggregateService::new(category_repo.clone());
        NominationService::new(nomination_repo, category_repo, aggregate)
    }

    fn input(name: &str) -> CreateNominationInput {
        CreateNominationInput {
            category_id: "cat1".to_string(),
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_add_nomination_to_aggregate_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[category(CategoryType::Aggregate)]])
            .into_connection();

        let result = service(db).add_nomination(input("Alice")).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_add_nomination_validates_name() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service.add_nomination(input("")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
