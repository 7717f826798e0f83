//! Category service.

use chrono::Utc;
use podium_common::{AppError, AppResult, IdGenerator};
use podium_db::{
    entities::{category, category::CategoryType},
    repositories::{CategoryRepository, ShowRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::aggregate::AggregateService;

/// Input for adding a category to a show.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    pub show_id: String,

    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    #[serde(rename = "type", default)]
    pub category_type: CategoryType,

    /// Number of places a voter ranks. Ranking categories only.
    #[validate(range(min = 1))]
    pub ranking_top: Option<i32>,

    /// Categories rolled up by an aggregate. Aggregate categories only.
    #[serde(default)]
    pub source_category_ids: Vec<String>,
}

/// Check that type-specific fields are present exactly where they apply.
fn check_type_fields(input: &CreateCategoryInput) -> AppResult<()> {
    let is_ranking = input.category_type == CategoryType::Ranking;
    let is_aggregate = input.category_type == CategoryType::Aggregate;

    if is_ranking && input.ranking_top.is_none() {
        return Err(AppError::BadRequest(
            "Ranking categories need the number of places to rank".to_string(),
        ));
    }
    if !is_ranking && input.ranking_top.is_some() {
        return Err(AppError::BadRequest(
            "Only ranking categories take a number of places".to_string(),
        ));
    }
    if !is_aggregate && !input.source_category_ids.is_empty() {
        return Err(AppError::BadRequest(
            "Only aggregate categories take source categories".to_string(),
        ));
    }
    Ok(())
}

/// Category service for organizer operations.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
    show_repo: ShowRepository,
    aggregate: AggregateService,
    id_gen: IdGenerator,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(
        category_repo: CategoryRepository,
        show_repo: ShowRepository,
        aggregate: AggregateService,
    ) -> Self {
        Self {
            category_repo,
            show_repo,
            aggregate,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a category to a show.
    ///
    /// A new aggregate starts with one nomination per distinct name found
    /// in its sources.
    pub async fn add_category(&self, input: CreateCategoryInput) -> AppResult<category::Model> {
        input.validate()?;
        check_type_fields(&input)?;
        let show = self.show_repo.get_by_id(&input.show_id).await?;

        let source_ids: Vec<String> = if input.category_type == CategoryType::Aggregate {
            self.aggregate
                .resolve_sources(&show.id, &input.source_category_ids)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect()
        } else {
            Vec::new()
        };

        let id = self.id_gen.generate();
        let model = category::ActiveModel {
            id: Set(id.clone()),
            show_id: Set(show.id),
            name: Set(input.name),
            description: Set(input.description.filter(|d| !d.is_empty())),
            category_type: Set(input.category_type),
            is_active: Set(false),
            revealed: Set(false),
            hide_vote_counts: Set(false),
            winner_only: Set(false),
            ranking_top: Set(input.ranking_top),
            created_at: Set(Utc::now().into()),
        };

        let category = self
            .category_repo
            .create(model, &source_ids, |source_nominations| {
                self.aggregate.initial_nominations(&id, source_nominations)
            })
            .await?;

        tracing::info!(
            category_id = %category.id,
            show_id = %category.show_id,
            category_type = ?category.category_type,
            sources = source_ids.len(),
            "Category created"
        );
        Ok(category)
    }

    /// Get a category by ID.
    pub async fn get_category(&self, id: &str) -> AppResult<category::Model> {
        self.category_repo.get_by_id(id).await
    }

    /// Categories of a show that an aggregate may roll up.
    pub async fn list_source_candidates(&self, show_id: &str) -> AppResult<Vec<category::Model>> {
        self.category_repo.find_source_candidates(show_id).await
    }

    /// Delete a category with its nominations and ballots.
    pub async fn delete_category(&self, id: &str) -> AppResult<()> {
        self.category_repo.delete(id).await?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
