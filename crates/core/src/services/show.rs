//! Show service.

use chrono::Utc;
use podium_common::{AppResult, IdGenerator};
use podium_db::{
    entities::show,
    repositories::{CategoryRepository, ShowListing, ShowRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::access::hash_password;
use super::tally::{CategoryTally, TallyService};

/// Slugs are lowercase ASCII letters, digits and hyphens.
fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        Ok(())
    } else {
        Err(ValidationError::new("slug")
            .with_message("Only lowercase letters, numbers and hyphens are allowed".into()))
    }
}

/// Input for creating a show.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShowInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 100), custom(function = "validate_slug"))]
    pub slug: String,

    #[validate(length(min = 4, max = 100))]
    pub password: Option<String>,
}

/// A show with the live standings of its categories.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub has_password: bool,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub updated_at: chrono::DateTime<chrono::FixedOffset>,
    pub categories: Vec<CategoryTally>,
}

/// Show service for business logic.
#[derive(Clone)]
pub struct ShowService {
    show_repo: ShowRepository,
    category_repo: CategoryRepository,
    tally: TallyService,
    id_gen: IdGenerator,
}

impl ShowService {
    /// Create a new show service.
    #[must_use]
    pub const fn new(
        show_repo: ShowRepository,
        category_repo: CategoryRepository,
        tally: TallyService,
    ) -> Self {
        Self {
            show_repo,
            category_repo,
            tally,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new show.
    pub async fn create_show(&self, mut input: CreateShowInput) -> AppResult<show::Model> {
        // An empty password field means no password.
        input.password = input.password.filter(|p| !p.is_empty());
        input.validate()?;

        let password = input.password.as_deref().map(hash_password).transpose()?;
        let now = Utc::now();

        let model = show::ActiveModel {
            id: Set(self.id_gen.generate()),
            slug: Set(input.slug),
            name: Set(input.name),
            password: Set(password),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let show = self.show_repo.create(model).await?;
        tracing::info!(show_id = %show.id, slug = %show.slug, "Show created");
        Ok(show)
    }

    /// Get a show with every category.
    pub async fn get_show(&self, id: &str) -> AppResult<ShowView> {
        let show = self.show_repo.get_by_id(id).await?;
        self.view(show, false).await
    }

    /// Get a show by slug, optionally only with its open category.
    pub async fn get_show_by_slug(&self, slug: &str, active_only: bool) -> AppResult<ShowView> {
        let show = self.show_repo.get_by_slug(slug).await?;
        self.view(show, active_only).await
    }

    /// List all shows, most recently updated first.
    pub async fn list_shows(&self) -> AppResult<Vec<ShowListing>> {
        self.show_repo.list_recent().await
    }

    /// Delete a show with everything in it.
    pub async fn delete_show(&self, id: &str) -> AppResult<()> {
        self.show_repo.delete(id).await?;
        tracing::info!(show_id = %id, "Show deleted");
        Ok(())
    }

    async fn view(&self, show: show::Model, active_only: bool) -> AppResult<ShowView> {
        let categories = self.category_repo.find_by_show(&show.id, active_only).await?;

        let mut tallies = Vec::with_capacity(categories.len());
        for category in &categories {
            tallies.push(self.tally.tally(category).await?);
        }

        Ok(ShowView {
            has_password: show.password.is_some(),
            id: show.id,
            slug: show.slug,
            name: show.name,
            created_at: show.created_at,
            updated_at: show.updated_at,
            categories: tallies,
        })
    }
}
