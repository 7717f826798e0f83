//! Ranked ballot validation and submission.

use std::collections::HashSet;

use chrono::Utc;
use podium_common::{AppError, AppResult, IdGenerator};
use podium_db::{
    entities::{ballot, category::CategoryType},
    repositories::{BallotRepository, CategoryRepository, NominationRepository},
};
use sea_orm::Set;
use serde::Deserialize;

use super::ballot::{ensure_open, require_device};

/// One position in a submitted ranking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub nomination_id: String,
    pub rank: i32,
}

/// Check that `rankings` is a complete ranking of `top` distinct nominations
/// drawn from `allowed`.
///
/// Checks run in a fixed order so the first failure names the problem: the
/// entry count, then membership, then the rank permutation, then repeated
/// nominations.
pub fn validate_rankings(
    top: i32,
    allowed: &HashSet<&str>,
    rankings: &[RankingEntry],
) -> AppResult<()> {
    if usize::try_from(top).ok() != Some(rankings.len()) {
        return Err(AppError::BadRequest(format!(
            "Expected exactly {top} ranked nominations, got {}",
            rankings.len()
        )));
    }

    if let Some(entry) = rankings
        .iter()
        .find(|r| !allowed.contains(r.nomination_id.as_str()))
    {
        return Err(AppError::BadRequest(format!(
            "Nomination {} does not belong to this category",
            entry.nomination_id
        )));
    }

    let mut ranks: Vec<i32> = rankings.iter().map(|r| r.rank).collect();
    ranks.sort_unstable();
    if !ranks.iter().copied().eq(1..=top) {
        return Err(AppError::BadRequest(format!(
            "Ranks must be each of 1 to {top} exactly once"
        )));
    }

    let mut seen = HashSet::with_capacity(rankings.len());
    if rankings.iter().any(|r| !seen.insert(r.nomination_id.as_str())) {
        return Err(AppError::BadRequest(
            "Each nomination can only be ranked once".to_string(),
        ));
    }

    Ok(())
}

/// Accepts full rankings for ranking categories.
#[derive(Clone)]
pub struct RankingService {
    ballot_repo: BallotRepository,
    category_repo: CategoryRepository,
    nomination_repo: NominationRepository,
    id_gen: IdGenerator,
}

impl RankingService {
    /// Create a new ranking service.
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

    /// Replace the device's ranking in a category with `rankings`.
    ///
    /// Nothing is written unless the whole ranking is valid.
    pub async fn submit_ranking(
        &self,
        device_id: Option<&str>,
        category_id: &str,
        rankings: Vec<RankingEntry>,
    ) -> AppResult<()> {
        let device_id = require_device(device_id)?;
        let category = self.category_repo.get_by_id(category_id).await?;

        if category.category_type != CategoryType::Ranking {
            return Err(AppError::BadRequest(
                "This category does not accept rankings".to_string(),
            ));
        }
        ensure_open(&category)?;
        let top = category.ranking_top.filter(|top| *top > 0).ok_or_else(|| {
            AppError::BadRequest("This category has no ranking size configured".to_string())
        })?;

        let nominations = self.nomination_repo.find_by_category(category_id).await?;
        let allowed: HashSet<&str> = nominations.iter().map(|n| n.id.as_str()).collect();
        validate_rankings(top, &allowed, &rankings)?;

        let now = Utc::now();
        let ballots = rankings
            .into_iter()
            .map(|entry| ballot::ActiveModel {
                id: Set(self.id_gen.generate()),
                nomination_id: Set(entry.nomination_id),
                category_id: Set(category.id.clone()),
                device_id: Set(device_id.to_string()),
                rank: Set(Some(entry.rank)),
                created_at: Set(now.into()),
            })
            .collect();

        self.ballot_repo
            .replace_for_device(device_id, &category.id, ballots)
            .await?;

        tracing::debug!(category_id = %category.id, top, "Ranking submitted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use podium_db::entities::{category, nomination};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn entries(pairs: &[(&str, i32)]) -> Vec<RankingEntry> {
        pairs
            .iter()
            .map(|(id, rank)| RankingEntry {
                nomination_id: (*id).to_string(),
                rank: *rank,
            })
            .collect()
    }

    fn allowed() -> HashSet<&'static str> {
        HashSet::from(["a", "b", "c", "d"])
    }

    fn assert_bad_request(result: AppResult<()>) {
        assert!(matches!(result, Err(AppError::BadRequest(_))), "{result:?}");
    }

    #[test]
    fn test_valid_permutation_in_any_order() {
        validate_rankings(3, &allowed(), &entries(&[("a", 1), ("b", 2), ("c", 3)])).unwrap();
        validate_rankings(3, &allowed(), &entries(&[("c", 2), ("a", 3), ("d", 1)])).unwrap();
    }

    #[test]
    fn test_duplicate_rank() {
        assert_bad_request(validate_rankings(
            3,
            &allowed(),
            &entries(&[("a", 1), ("b", 2), ("c", 2)]),
        ));
    }

    #[test]
    fn test_rank_out_of_range() {
        assert_bad_request(validate_rankings(
            3,
            &allowed(),
            &entries(&[("a", 1), ("b", 2), ("c", 4)]),
        ));
        assert_bad_request(validate_rankings(
            3,
            &allowed(),
            &entries(&[("a", 0), ("b", 1), ("c", 2)]),
        ));
    }

    #[test]
    fn test_wrong_length() {
        assert_bad_request(validate_rankings(3, &allowed(), &entries(&[("a", 1), ("b", 2)])));
    }

    #[test]
    fn test_foreign_nomination() {
        assert_bad_request(validate_rankings(
            3,
            &allowed(),
            &entries(&[("a", 1), ("b", 2), ("zz", 3)]),
        ));
    }

    #[test]
    fn test_repeated_nomination() {
        assert_bad_request(validate_rankings(
            3,
            &allowed(),
            &entries(&[("a", 1), ("a", 2), ("b", 3)]),
        ));
    }

    fn ranking_category(is_active: bool) -> category::Model {
        category::Model {
            id: "cat1".to_string(),
            show_id: "show1".to_string(),
            name: "Top Three".to_string(),
            description: None,
            category_type: CategoryType::Ranking,
            is_active,
            revealed: false,
            hide_vote_counts: false,
            winner_only: false,
            ranking_top: Some(2),
            created_at: Utc::now().into(),
        }
    }

    fn nomination(id: &str) -> nomination::Model {
        nomination::Model {
            id: id.to_string(),
            category_id: "cat1".to_string(),
            name: id.to_uppercase(),
            description: None,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> RankingService {
        let db = Arc::new(db);
        RankingService::new(
            BallotRepository::new(db.clone()),
            CategoryRepository::new(db.clone()),
            NominationRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_submit_ranking() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[ranking_category(true)]])
            .append_query_results([vec![nomination("a"), nomination("b")]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
            ])
            .into_connection();

        service(db)
            .submit_ranking(Some("device1"), "cat1", entries(&[("b", 1), ("a", 2)]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_ranking_inactive() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[ranking_category(false)]])
            .into_connection();

        let result = service(db)
            .submit_ranking(Some("device1"), "cat1", entries(&[("b", 1), ("a", 2)]))
            .await;
        assert_bad_request(result);
    }
}
