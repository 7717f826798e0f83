//! Ballot service.

use chrono::Utc;
use podium_common::{AppError, AppResult, IdGenerator};
use podium_db::{
    entities::{ballot, category, category::CategoryType, nomination},
    repositories::{BallotRepository, CategoryRepository, NominationRepository},
};
use sea_orm::Set;
use serde::Serialize;

/// Resolve the voter's device, failing when the cookie is missing.
pub(crate) fn require_device(device_id: Option<&str>) -> AppResult<&str> {
    device_id.filter(|id| !id.is_empty()).ok_or_else(|| {
        AppError::Unauthorized("No device ID found - please enable cookies".to_string())
    })
}

/// Fail unless `category` currently accepts ballots.
pub(crate) fn ensure_open(category: &category::Model) -> AppResult<()> {
    if !category.is_active {
        return Err(AppError::BadRequest(
            "Voting is not currently active for this category".to_string(),
        ));
    }
    Ok(())
}

/// A ranked nomination as the device submitted it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedNomination {
    pub rank: i32,
    pub nomination: nomination::Model,
}

/// Ballot service for single-choice voting and resets.
#[derive(Clone)]
pub struct BallotService {
    ballot_repo: BallotRepository,
    category_repo: CategoryRepository,
    nomination_repo: NominationRepository,
    id_gen: IdGenerator,
}

impl BallotService {
    /// Create a new ballot service.
    #[must_use]
    pub const fn new(
        ballot_repo: BallotRepository,
        category_repo: CategoryRepository,
        nomination_repo: NominationRepository,
    ) -> Self {
        Self {
            ballot_repo,
            category_repo,
            nomination_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast a single-choice ballot, replacing the device's previous one in
    /// the same category.
    pub async fn cast_ballot(
        &self,
        device_id: Option<&str>,
        nomination_id: &str,
    ) -> AppResult<ballot::Model> {
        let device_id = require_device(device_id)?;
        let (nomination, category) = self.nomination_repo.get_with_category(nomination_id).await?;

        match category.category_type {
            CategoryType::Standard | CategoryType::Image => {}
            CategoryType::Aggregate => {
                return Err(AppError::BadRequest(
                    "Cannot vote in aggregate categories".to_string(),
                ));
            }
            CategoryType::Ranking => {
                return Err(AppError::BadRequest(
                    "Ranking categories take a full ranking, not a single ballot".to_string(),
                ));
            }
        }
        ensure_open(&category)?;

        let model = ballot::Model {
            id: self.id_gen.generate(),
            nomination_id: nomination.id,
            category_id: category.id,
            device_id: device_id.to_string(),
            rank: None,
            created_at: Utc::now().into(),
        };
        let active = ballot::ActiveModel {
            id: Set(model.id.clone()),
            nomination_id: Set(model.nomination_id.clone()),
            category_id: Set(model.category_id.clone()),
            device_id: Set(model.device_id.clone()),
            rank: Set(None),
            created_at: Set(model.created_at),
        };

        self.ballot_repo
            .replace_for_device(device_id, &model.category_id, vec![active])
            .await?;

        tracing::debug!(
            category_id = %model.category_id,
            nomination_id = %model.nomination_id,
            "Ballot cast"
        );

        Ok(model)
    }

    /// Whether the device has voted in a category. No device means no vote.
    pub async fn has_voted(&self, device_id: Option<&str>, category_id: &str) -> AppResult<bool> {
        match device_id.filter(|id| !id.is_empty()) {
            Some(device_id) => self.ballot_repo.has_voted(device_id, category_id).await,
            None => Ok(false),
        }
    }

    /// The nomination the device currently backs in a category.
    pub async fn current_ballot(
        &self,
        device_id: Option<&str>,
        category_id: &str,
    ) -> AppResult<Option<nomination::Model>> {
        let Some(device_id) = device_id.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        let ballots = self
            .ballot_repo
            .find_by_device_with_nominations(device_id, category_id)
            .await?;

        Ok(ballots.into_iter().next().map(|(_, nomination)| nomination))
    }

    /// The device's ranked ballots in a category, best first.
    pub async fn current_ranking(
        &self,
        device_id: Option<&str>,
        category_id: &str,
    ) -> AppResult<Vec<RankedNomination>> {
        let Some(device_id) = device_id.filter(|id| !id.is_empty()) else {
            return Ok(vec![]);
        };

        let ballots = self
            .ballot_repo
            .find_by_device_with_nominations(device_id, category_id)
            .await?;

        Ok(ballots
            .into_iter()
            .filter_map(|(ballot, nomination)| {
                ballot.rank.map(|rank| RankedNomination { rank, nomination })
            })
            .collect())
    }

    /// Delete every ballot in a category.
    pub async fn reset_category_votes(&self, category_id: &str) -> AppResult<u64> {
        self.category_repo.get_by_id(category_id).await?;
        let deleted = self.ballot_repo.delete_by_category(category_id).await?;

        tracing::info!(category_id = %category_id, deleted, "Reset category votes");
        Ok(deleted)
    }

    /// Delete every ballot in a show.
    pub async fn reset_all_votes(&self, show_id: &str) -> AppResult<u64> {
        let deleted = self.ballot_repo.delete_by_show(show_id).await?;

        tracing::info!(show_id = %show_id, deleted, "Reset all votes");
        Ok(deleted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn category(category_type: CategoryType, is_active: bool) -> category::Model {
        category::Model {
            id: "cat1".to_string(),
            show_id: "show1".to_string(),
            name: "Best Costume".to_string(),
            description: None,
            category_type,
            is_active,
            revealed: false,
            hide_vote_counts: false,
            winner_only: false,
            ranking_top: None,
            created_at: Utc::now().into(),
        }
    }

    fn nomination(id: &str) -> nomination::Model {
        nomination::Model {
            id: id.to_string(),
            category_id: "cat1".to_string(),
            name: "Alice".to_string(),
            description: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> BallotService {
        let db = Arc::new(db);
        BallotService::new(
            BallotRepository::new(db.clone()),
            CategoryRepository::new(db.clone()),
            NominationRepository::new(db),
        )
    }

    fn with_nomination(category: category::Model) -> sea_orm::DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[(nomination("nom1"), category)]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection()
    }

    #[test]
    fn test_require_device() {
        assert_eq!(require_device(Some("device1")).unwrap(), "device1");
        assert!(matches!(require_device(None), Err(AppError::Unauthorized(_))));
        assert!(matches!(require_device(Some("")), Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_cast_ballot() {
        let service = service(with_nomination(category(CategoryType::Standard, true)));

        let ballot = service.cast_ballot(Some("device1"), "nom1").await.unwrap();

        assert_eq!(ballot.category_id, "cat1");
        assert_eq!(ballot.rank, None);
    }

    #[tokio::test]
    async fn test_cast_ballot_inactive_category() {
        let service = service(with_nomination(category(CategoryType::Image, false)));

        let result = service.cast_ballot(Some("device1"), "nom1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_cast_ballot_rejects_aggregate_and_ranking() {
        for category_type in [CategoryType::Aggregate, CategoryType::Ranking] {
            let service = service(with_nomination(category(category_type, true)));

            let result = service.cast_ballot(Some("device1"), "nom1").await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }

    #[tokio::test]
    async fn test_cast_ballot_without_device() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service.cast_ballot(None, "nom1").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_reads_without_device() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        assert!(!service.has_voted(None, "cat1").await.unwrap());
        assert!(service.current_ballot(None, "cat1").await.unwrap().is_none());
        assert!(service.current_ranking(Some(""), "cat1").await.unwrap().is_empty());
    }
}
