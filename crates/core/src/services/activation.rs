//! Category activation and presentation toggles.

use podium_common::AppResult;
use podium_db::{
    entities::category,
    repositories::{CategoryFlag, CategoryRepository},
};

/// Controls which category is open for voting and how results show.
#[derive(Clone)]
pub struct ActivationService {
    category_repo: CategoryRepository,
}

impl ActivationService {
    /// Create a new activation service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository) -> Self {
        Self { category_repo }
    }

    /// Open a category for voting, closing every other category of its
    /// show. An already open category is closed instead.
    pub async fn activate_category(&self, category_id: &str) -> AppResult<category::Model> {
        let category = self.category_repo.toggle_active(category_id).await?;

        tracing::info!(
            category_id = %category.id,
            show_id = %category.show_id,
            is_active = category.is_active,
            "Category activation toggled"
        );
        Ok(category)
    }

    /// Show or hide a category's results.
    pub async fn toggle_reveal(&self, category_id: &str) -> AppResult<category::Model> {
        self.toggle(category_id, CategoryFlag::Revealed).await
    }

    /// Show or hide raw counts on the presentation screen.
    pub async fn toggle_hide_vote_counts(&self, category_id: &str) -> AppResult<category::Model> {
        self.toggle(category_id, CategoryFlag::HideVoteCounts).await
    }

    /// Show only the winner, or the full standings.
    pub async fn toggle_winner_only(&self, category_id: &str) -> AppResult<category::Model> {
        self.toggle(category_id, CategoryFlag::WinnerOnly).await
    }

    async fn toggle(&self, category_id: &str, flag: CategoryFlag) -> AppResult<category::Model> {
        let category = self.category_repo.toggle_flag(category_id, flag).await?;

        tracing::info!(category_id = %category.id, flag = ?flag, "Category flag toggled");
        Ok(category)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use podium_db::entities::category::CategoryType;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_toggle_reveal() {
        let revealed = category::Model {
            id: "cat1".to_string(),
            show_id: "show1".to_string(),
            name: "Best Costume".to_string(),
            description: None,
            category_type: CategoryType::Standard,
            is_active: false,
            revealed: true,
            hide_vote_counts: false,
            winner_only: false,
            ranking_top: None,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[revealed]])
                .into_connection(),
        );

        let service = ActivationService::new(CategoryRepository::new(db));
        let category = service.toggle_reveal("cat1").await.unwrap();

        assert!(category.revealed);
        assert!(!category.is_active);
    }
}
